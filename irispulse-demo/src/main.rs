mod scenario;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Optional frame count: `irispulse-demo 1800` runs 20 seconds at 90 Hz.
    let frames = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or(900);

    scenario::run(frames)
}
