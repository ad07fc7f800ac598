use super::register_aliases;
use crate::engine::os::OsQuery;
use crate::error::{FmshError, FmshResult};
use crate::parser::is_flag;
use crate::registry::{Category, CommandContext, CommandDoc, CommandRegistry};

pub(super) fn register(registry: &mut CommandRegistry) -> FmshResult<()> {
    let flags = OsQuery::ALL
        .iter()
        .map(|q| format!("  --{:14}{}", q.flag(), q.label()))
        .collect::<Vec<_>>()
        .join("\n");

    registry.register_fn(
        "os",
        os,
        CommandDoc::new(Category::OsInfo, "Show information about the operating system")
            .syntax("os --<flag> [--<flag>...]")
            .example("os --cpus --memory")
            .details(format!("Flags:\n{flags}")),
        false,
    );

    registry.register_fn(
        "sysinfo",
        |_args: &[String], ctx: &mut CommandContext<'_>| {
            for query in OsQuery::ALL {
                ctx.console.print(&format!("{}: {}", query.label(), query.value()));
            }
            Ok(())
        },
        CommandDoc::new(Category::OsInfo, "Show every available system property").syntax("sysinfo"),
        false,
    );
    register_aliases(registry, "sysinfo", &["systeminfo"])?;

    Ok(())
}

fn os(args: &[String], ctx: &mut CommandContext<'_>) -> FmshResult<()> {
    let mut queries = Vec::new();
    for arg in args {
        if !is_flag(arg) {
            return Err(FmshError::InvalidArgument(format!(
                "expected a flag such as --cpus, got '{arg}'"
            )));
        }
        let query: OsQuery = arg.parse()?;
        if !queries.contains(&query) {
            queries.push(query);
        }
    }

    match queries.as_slice() {
        [] => Err(FmshError::MissingArgument("flag")),
        [single] => {
            ctx.console.print(&single.value());
            Ok(())
        }
        many => {
            for query in many {
                ctx.console.print(&format!("{}: {}", query.label(), query.value()));
            }
            Ok(())
        }
    }
}
