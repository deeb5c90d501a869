//! Audio device listing command.

use clap::Args;
use ongen_io::list_output_devices;

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_output_devices()?;

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    println!("Output Devices");
    println!("==============\n");
    for device in &devices {
        println!(
            "  [{}] {} ({} Hz, {} ch){}",
            device.index,
            device.name,
            device.default_sample_rate,
            device.channels,
            if device.is_default { " (default)" } else { "" }
        );
    }
    println!();
    println!("Tip: Use device index or partial name with --output:");
    println!("  ongen play scale --output 0");

    Ok(())
}
