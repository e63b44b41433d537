//! Embed a watermark into an image and immediately test for it.
//!
//! Usage:
//! ```sh
//! cargo run --example embed_and_detect -- input.png output.png [strength]
//! ```

use std::env;
use std::process;

use seeded_watermark::{WatermarkCodec, WatermarkOptions};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output> [strength]", args[0]);
        process::exit(1);
    }

    let strength = match args.get(3).map(|s| s.parse::<u8>()) {
        Some(Ok(s)) => s,
        Some(Err(e)) => {
            eprintln!("Invalid strength: {e}");
            process::exit(1);
        }
        None => 20,
    };

    let codec = WatermarkCodec::new(WatermarkOptions {
        strength,
        ..WatermarkOptions::default()
    });

    let embedded = codec.embed_file(args[1].as_ref(), args[2].as_ref());
    if !embedded.success {
        eprintln!("Error: {}", embedded.message);
        process::exit(1);
    }
    println!("Done: {}", embedded.message);

    let tested = codec.detect_files(args[1].as_ref(), args[2].as_ref());
    println!("{}", tested.message);
}
