fn main() -> anyhow::Result<()> {
    defscope_cli::run()
}
