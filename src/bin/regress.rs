// regress CLI: inspect and maintain canonical artifacts.
// Usage: regress [--root DIR] <list|show|remove|clear>

fn main() -> miette::Result<()> {
    regress::cli::run()
}
