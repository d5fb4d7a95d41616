//! Print a summary of a recording.
//!
//! Usage: `rec_dump <recording>`

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{Report, eyre::{WrapErr, eyre}};
use std::{env, path::PathBuf};

use car_if::config::{format_fixed, DriverConfig, CONFIG_TAG};
use drive_lib::rec::{frame::FRAME_TAG, reader::{ChunkReader, RecordedFrame}};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        return Err(eyre!("Expected exactly one argument, the path to the recording"))
    }
    let path = PathBuf::from(&args[1]);

    let data = std::fs::read(&path)
        .wrap_err_with(|| format!("Could not read {:?}", path))?;

    let mut num_frames = 0usize;
    let mut first_t: Option<f64> = None;

    for (i, chunk) in ChunkReader::new(&data).enumerate() {
        let chunk = chunk.wrap_err_with(|| format!("Invalid chunk #{}", i))?;

        match chunk.tag {
            CONFIG_TAG => {
                let config = DriverConfig::from_chunk(chunk.data)
                    .wrap_err("Invalid configuration chunk")?;
                println!("Configuration:");
                for (name, value) in DriverConfig::names().iter().zip(config.values().iter()) {
                    println!("    {:16} {:>8}", name, format_fixed(*value));
                }
            },
            FRAME_TAG => {
                let frame = RecordedFrame::decode(chunk.data)
                    .wrap_err_with(|| format!("Invalid frame in chunk #{}", i))?;

                let t = frame.secs as f64 + frame.usecs as f64 * 1e-6;
                let t0 = *first_t.get_or_insert(t);
                let u = frame.car.actuation();

                println!(
                    "{:6} {:10.3} s  thr {:+.2} str {:+.2}  v {:6.2} m/s  dist {:7.2} m  \
                     gyro_z {:+.3}  ctl {} ({} B)  img {}x{}",
                    num_frames,
                    t - t0,
                    u.throttle,
                    u.steering,
                    frame.car.wheel_v,
                    frame.car.wheel_dist,
                    frame.car.gyro[2],
                    String::from_utf8_lossy(&frame.controller.tag),
                    frame.controller.data.len(),
                    frame.width,
                    if frame.width > 0 {
                        frame.image.len() * 2 / 3 / frame.width as usize
                    } else {
                        0
                    }
                );
                num_frames += 1;
            },
            tag => println!("Unknown chunk {} ({} B)", String::from_utf8_lossy(&tag), chunk.data.len())
        }
    }

    println!("{} frames", num_frames);

    Ok(())
}
