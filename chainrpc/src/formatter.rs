use chainrpc_core::descriptors::{ArgRouting, InterfaceDescriptor, MethodDescriptor, MethodResult};
use colored::*;
use http::Response;
use std::fmt::Write;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

/// An interface with its continuations expanded `depth` levels deep.
pub struct InterfaceTree(pub &'static InterfaceDescriptor, pub usize);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<Response<String>> for FormattedString {
    fn from(response: Response<String>) -> Self {
        let status = response.status();
        let label = status.to_string();
        let label = if status.is_success() {
            label.green().bold()
        } else if status == chainrpc_core::rpc::APPLICATION_EXCEPTION_STATUS {
            label.yellow().bold()
        } else {
            label.red().bold()
        };

        FormattedString(format!("{}\n\n{}", label, response.body()))
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        FormattedString(format!("{}\n\n'{:#}'", "Call Failed:".red().bold(), err))
    }
}

impl From<InterfaceTree> for FormattedString {
    fn from(tree: InterfaceTree) -> Self {
        FormattedString(tree.to_string().trim_end().to_string())
    }
}

impl std::fmt::Display for InterfaceTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_interface(f, self.0, self.1, 0)
    }
}

fn write_interface(
    f: &mut impl Write,
    interface: &InterfaceDescriptor,
    depth: usize,
    level: usize,
) -> std::fmt::Result {
    let indent = "    ".repeat(level);

    write!(f, "{}{} {}", indent, "interface".cyan(), interface.name().green())?;
    if let Some(base) = interface.base() {
        write!(f, " {} {}", ":".cyan(), base.name().green())?;
    }
    if let Some(exception) = interface.exception() {
        write!(f, " {} {}", "throws".cyan(), exception.name().yellow())?;
    }
    writeln!(f, " {{")?;

    for method in interface.methods() {
        writeln!(f, "{}  {}", indent, format_method(method))?;

        if let MethodResult::Interface(next) = method.result()
            && level < depth
        {
            write_interface(f, next, depth, level + 1)?;
        }
    }

    writeln!(f, "{indent}}}")
}

fn format_method(method: &MethodDescriptor) -> String {
    let args: Vec<String> = method
        .args()
        .iter()
        .map(|arg| {
            let routing = match arg.routing() {
                ArgRouting::Path => "path",
                ArgRouting::Query => "query",
                ArgRouting::Body => "body",
            };
            format!("{}: {} {}", arg.name(), arg.ty().to_string().yellow(), routing.dimmed())
        })
        .collect();

    let verb = if method.is_post() {
        format!("{} ", "POST".magenta())
    } else {
        String::new()
    };

    format!(
        "{}{}({}) {} {}",
        verb,
        method.name().green(),
        args.join(", "),
        "->".cyan(),
        method.result().to_string().yellow()
    )
}
