//! Command implementations

pub mod check;
pub mod completions;
pub mod normalize;
pub mod settings;
pub mod tree;
pub mod values;

use std::path::Path;

use normargs::util::diagnostic::{emit, suggestions};
use normargs::{ArgError, GlobalContext};

/// Print a pipeline error as a diagnostic and exit with status 1.
pub(crate) fn fail(err: &ArgError, ctx: &GlobalContext, location: Option<&Path>, color: bool) -> ! {
    let mut diagnostic = err.to_diagnostic_limited(ctx.max_candidates());
    if let Some(path) = location {
        diagnostic = diagnostic.with_location(path);
    }
    emit(&diagnostic, color);
    if location.is_some() {
        eprintln!("{}", suggestions::LIST_VALUES);
    }
    std::process::exit(1);
}
