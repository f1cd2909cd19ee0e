use bytes::BytesMut;
use mossbrain_client::connect;
use mossbrain_frame::{encode_frame, Command};

use crate::cmd::CallArgs;
use crate::exit::{client_error, frame_error, CliResult, SUCCESS};
use crate::output::{print_reply, OutputFormat};
use crate::settings::Settings;

pub fn run(args: CallArgs, settings: &Settings, format: OutputFormat) -> CliResult<i32> {
    // Reject bad input before paying for discovery and connect.
    let command = validate(&args.command, &args.args)?;
    let config = settings.client_config()?;

    let mut client = connect(&config).map_err(|err| client_error("connect failed", err))?;
    let reply = client
        .send(command, &args.args)
        .map_err(|err| client_error("call failed", err))?;
    client.close();

    print_reply(command, &args.args, &reply, format);
    Ok(SUCCESS)
}

fn validate(name: &str, args: &[i64]) -> CliResult<Command> {
    let command: Command = name.parse().map_err(|err| frame_error("call", err))?;
    encode_frame(command.opcode(), args, &mut BytesMut::new())
        .map_err(|err| frame_error("call", err))?;
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_known_commands() {
        assert_eq!(
            validate("setLEDState", &[0, 255, 0]).expect("valid call"),
            Command::SetLedState
        );
        assert_eq!(
            validate("getAllFaceValues", &[]).expect("valid call"),
            Command::GetAllFaceValues
        );
    }

    #[test]
    fn validate_rejects_bad_input_as_usage() {
        assert!(validate("fly", &[]).expect_err("unknown command").is_usage());
        assert!(validate("setLEDState", &[0, 256, 0])
            .expect_err("out of range")
            .is_usage());
        assert!(validate("setFaceValue", &[-1, 0])
            .expect_err("negative")
            .is_usage());
    }
}
