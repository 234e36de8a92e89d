//! `caudal formats` - list the known sample formats.

use caudal_core::Format;
use clap::Args;

#[derive(Args)]
pub struct FormatsArgs {
    /// Only list formats the channel-area kernels can operate on
    #[arg(long)]
    pub fixed_width: bool,
}

pub fn run(args: FormatsArgs) -> anyhow::Result<()> {
    println!("{:<20} {:>5}  {}", "NAME", "BITS", "DESCRIPTION");
    for format in Format::ALL {
        let width = format.physical_width();
        if args.fixed_width && width.is_none() {
            continue;
        }
        let bits = width.map_or_else(|| "-".to_owned(), |w| w.to_string());
        println!("{:<20} {:>5}  {}", format.name(), bits, format.description());
    }
    Ok(())
}
