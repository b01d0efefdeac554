pub mod rsrc;

use argh::FromArgs;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub enum SubCommand {
    List(rsrc::ListArgs),
    Extract(rsrc::ExtractArgs),
    Rewrite(rsrc::RewriteArgs),
}
