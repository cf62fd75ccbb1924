use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("scmibox {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: scmibox");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", option_env!("SCMIBOX_BUILD_TARGET").unwrap_or("unknown"));
    println!("profile: {}", option_env!("SCMIBOX_BUILD_PROFILE").unwrap_or("unknown"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "mapped_region: {}",
        if cfg!(unix) { "supported" } else { "unsupported" }
    );

    Ok(SUCCESS)
}
