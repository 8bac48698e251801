mod applications;
mod contacts;
mod events;
mod health_check;
mod users;
mod webinars;

pub use applications::*;
pub use contacts::*;
pub use events::*;
pub use health_check::*;
pub use users::*;
pub use webinars::*;

/// Walk the chain of sources when Debug-printing an error, so the log record
/// carries the whole causal story and not just the topmost message.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
