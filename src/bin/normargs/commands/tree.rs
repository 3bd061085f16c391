//! `normargs tree` command

use anyhow::Result;

use crate::cli::TreeArgs;
use normargs::GlobalContext;

pub fn execute(args: TreeArgs, ctx: &GlobalContext) -> Result<()> {
    let table = ctx.load_availability(&args.file)?;

    println!(
        "{} combinations over ({})",
        table.len(),
        table.keys().join(", ")
    );
    print!("{}", table.render_tree(args.depth));

    Ok(())
}
