use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    version,
    name = "wezup",
    about = "Install WezTerm plus recommended fonts and configuration for this machine"
)]
pub struct Cli {
    /// Print the resolved platform and package URL without installing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Answer yes to the font/configuration prompt
    #[arg(short = 'y', long)]
    pub assume_yes: bool,

    /// Skip the font and configuration phase entirely
    #[arg(long, conflicts_with = "assume_yes")]
    pub skip_extras: bool,
}
