use envi_reader::EnviImage;
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <image.hdr> [data-file] [--bands <0,1,2>] [--out <file>]",
            args[0]
        );
        std::process::exit(1);
    }

    let header_path = PathBuf::from(&args[1]);
    let mut data_arg: Option<PathBuf> = None;
    let mut bands: Option<Vec<i64>> = None;
    let mut out_path: Option<PathBuf> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--bands" => {
                let Some(list) = args.get(i + 1) else {
                    eprintln!("ERROR: --bands flag requires an argument.");
                    std::process::exit(1);
                };
                let parsed: Result<Vec<i64>, _> =
                    list.split(',').map(|part| part.trim().parse()).collect();
                match parsed {
                    Ok(indices) => bands = Some(indices),
                    Err(_) => {
                        eprintln!("ERROR: Invalid --bands list: {}", list);
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            "--out" => {
                let Some(path) = args.get(i + 1) else {
                    eprintln!("ERROR: --out flag requires an argument.");
                    std::process::exit(1);
                };
                out_path = Some(PathBuf::from(path));
                i += 2;
            }
            other => {
                data_arg = Some(PathBuf::from(other));
                i += 1;
            }
        }
    }

    let data_path = match data_arg {
        Some(path) => path,
        None => match EnviImage::find_data_file(&header_path) {
            Ok(path) => path,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(1);
            }
        },
    };

    println!("Reading ENVI image: {}", header_path.display());
    println!("{}", "=".repeat(60));

    match EnviImage::open(&header_path, &data_path) {
        Ok(image) => {
            println!("\nImage Information:");
            match image.dimensions() {
                Ok(dims) => println!(
                    "  Dimensions: {} lines x {} samples x {} bands",
                    dims.lines, dims.samples, dims.bands
                ),
                Err(e) => println!("  Dimensions: unavailable ({})", e),
            }
            match image.interleave() {
                Ok(interleave) => println!("  Interleave: {}", interleave),
                Err(e) => println!("  Interleave: unavailable ({})", e),
            }
            match image.data_type() {
                Ok(data_type) => println!("  Data type: {}", data_type),
                Err(e) => println!("  Data type: unavailable ({})", e),
            }
            if let Some(description) = image.description() {
                println!("  Description: {}", description);
            }

            if let Some(names) = image.band_names() {
                println!("\nBand Names (first 10):");
                for (i, name) in names.iter().take(10).enumerate() {
                    println!("  {}. {}", i + 1, name);
                }
                if names.len() > 10 {
                    println!("  ... and {} more", names.len() - 10);
                }
            }

            if let Some(channels) = bands {
                match image.read_bands(&channels) {
                    Ok(buffer) => {
                        let out = out_path.unwrap_or_else(|| header_path.with_extension("raw"));
                        if let Err(e) = fs::write(&out, &buffer) {
                            eprintln!("\nERROR: Failed to write {}: {}", out.display(), e);
                            std::process::exit(1);
                        }
                        println!(
                            "\nExtracted {} band(s), {} bytes -> {}",
                            channels.len(),
                            buffer.len(),
                            out.display()
                        );
                    }
                    Err(e) => {
                        eprintln!("\nERROR: Failed to extract bands");
                        eprintln!("  {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
        Err(e) => {
            eprintln!("\nERROR: Failed to open ENVI image");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
