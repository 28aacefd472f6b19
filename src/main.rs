fn main() -> anyhow::Result<()> {
    kiosk_lib::run()
}
