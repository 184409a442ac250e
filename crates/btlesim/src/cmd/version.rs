use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("btlesim {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: btlesim");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("build_target: {}", option_env!("BTLESIM_BUILD_TARGET").unwrap_or("unknown"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("protocol_version: {}", btlesim_frame::PROTOCOL_VERSION);
    println!("features: link={}, cli=true", cfg!(feature = "link"));

    Ok(SUCCESS)
}
