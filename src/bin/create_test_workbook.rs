fn main() -> anyhow::Result<()> {
    xlfixture::run()
}
