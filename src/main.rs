use clap::{arg, crate_version, Command};
use shrinkler::Options;
use std::fs::File;

const RCH: &str = "unreachable was reached";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let long_help = "Examples:
---------
Compress:      `shrinkler compress -i my_file -o my_file.shr -p 5`
Expand:        `shrinkler expand -i my_file.shr -o my_file`";

    let mut main_cmd = Command::new("shrinkler")
        .about("Compress and expand with the Shrinkler-compatible format")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(
        Command::new("compress")
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .arg(arg!(-o --output <PATH> "output path").required(true))
            .arg(arg!(-p --preset <PRESET> "compression preset 1..9").required(false))
            .about("compress a file"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("expand")
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .arg(arg!(-o --output <PATH> "output path").required(true))
            .about("expand a file"),
    );

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let preset: u32 = cmd
            .get_one::<String>("preset")
            .map(|s| s.parse().unwrap_or(3))
            .unwrap_or(3);
        let opt = Options::from_preset(preset);
        opt.validate()?;
        let mut src = File::open(path_in)?;
        let mut dst = File::create(path_out)?;
        let (in_size, out_size) = shrinkler::compress(&mut src, &mut dst, &opt)?;
        log::info!("compressed {in_size} bytes into {out_size} bytes");
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let mut src = File::open(path_in)?;
        let mut dst = File::create(path_out)?;
        let (in_size, out_size) = shrinkler::expand(&mut src, &mut dst)?;
        log::info!("expanded {in_size} bytes into {out_size} bytes");
    }

    Ok(())
}
