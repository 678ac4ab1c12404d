fn main() -> anyhow::Result<()> {
    pointer_resolver::run()
}
