use anyhow::Result;
use clap::Args;
use medusa_core::band::BandCatalog;

use crate::summary::print_band_table;

#[derive(Args)]
pub struct BandsArgs {
    /// Channel of the white reference LED
    #[arg(long, default_value = "14")]
    pub white: u8,
}

pub fn run(args: &BandsArgs) -> Result<()> {
    let catalog = BandCatalog::medusa(args.white);
    print_band_table(&catalog);
    Ok(())
}
