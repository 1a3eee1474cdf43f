//! Command dispatch for the `pix-rs` binary.

use clap::Parser;
use dotenvy::dotenv;
use pix_codec::{
    ChecksumMismatch, DecodeError, PayloadError, PaymentRequest, assemble_and_checksum, decode,
    verify,
};

use crate::charge::{ChargeError, ChargeIssuer, ChargeRequest};
use crate::config::{CliArgs, Command, Config};
use crate::telemetry::Telemetry;

/// Errors surfaced by a command.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Checksum(#[from] ChecksumMismatch),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Charge(#[from] ChargeError),
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Entry point of the binary.
///
/// - Loads `.env` variables.
/// - Parses the command line.
/// - Installs logging.
/// - Loads the config file, or the environment when none is given.
/// - Runs the command and prints its output to stdout.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let cli = CliArgs::parse();

    let _telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();

    let config = Config::load(cli.config.as_deref())
        .inspect_err(|e| tracing::error!("Failed to load configuration: {e}"))?;

    let output = execute(&cli.command, &config)?;
    println!("{output}");
    Ok(())
}

/// Runs one command against `config` and returns what it prints.
pub fn execute(command: &Command, config: &Config) -> Result<String, RunError> {
    match command {
        Command::Generate {
            amount,
            reference,
            key,
            name,
            city,
        } => {
            let merchant = config.merchant();
            let mut request = PaymentRequest::new(
                key.clone().unwrap_or(merchant.pix_key),
                name.clone().unwrap_or(merchant.name),
                city.clone().unwrap_or(merchant.city),
            )
            .with_reference_label(reference.as_str());
            request.amount = *amount;
            let payload = assemble_and_checksum(&request)?;
            Ok(payload.into_string())
        }
        Command::Verify { payload } => {
            verify(payload.trim())?;
            Ok("ok".to_string())
        }
        Command::Decode { payload } => {
            let decoded = decode(payload.trim())?;
            Ok(serde_json::to_string_pretty(&decoded)?)
        }
        Command::Charge {
            id,
            amount,
            description,
        } => {
            let issuer = ChargeIssuer::from_config(config);
            let charge = issuer.issue(&ChargeRequest {
                id: id.clone(),
                amount: *amount,
                description: description.clone(),
            })?;
            Ok(serde_json::to_string_pretty(&charge)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pix_codec::PixAmount;

    fn config() -> Config {
        serde_json::from_str(
            r#"{
                "pix_key": "test@pagamentos.com",
                "merchant_name": "Sistema de Pagamentos",
                "merchant_city": "SAO PAULO",
                "expiration_minutes": 30,
                "qr_renderer_url": "https://api.qrserver.com/v1/create-qr-code/?size=200x200"
            }"#,
        )
        .unwrap()
    }

    fn generate(amount: Option<&str>, reference: &str) -> Command {
        Command::Generate {
            amount: amount.map(|a| PixAmount::parse(a).unwrap()),
            reference: reference.to_string(),
            key: None,
            name: None,
            city: None,
        }
    }

    #[test]
    fn test_generate_uses_config() {
        let output = execute(&generate(Some("10.50"), "Pedido 123"), &config()).unwrap();
        assert_eq!(
            output,
            "00020101021126410014BR.GOV.BCB.PIX0119test@pagamentos.com520400005303986540510.505802BR5921Sistema de Pagamentos6009SAO PAULO62140510Pedido 1236304DF73"
        );
    }

    #[test]
    fn test_generate_overrides() {
        let command = Command::Generate {
            amount: Some(PixAmount::parse("1234").unwrap()),
            reference: "TX42".to_string(),
            key: Some("+5511999998888".to_string()),
            name: Some("Loja do Joao".to_string()),
            city: Some("RIO DE JANEIRO".to_string()),
        };
        let output = execute(&command, &config()).unwrap();
        assert!(output.ends_with("63044AD6"));
    }

    #[test]
    fn test_generate_empty_key_fails() {
        let command = Command::Generate {
            amount: None,
            reference: String::new(),
            key: Some(String::new()),
            name: None,
            city: None,
        };
        let err = execute(&command, &config()).unwrap_err();
        assert!(matches!(err, RunError::Payload(PayloadError::InvalidRequest(_))));
    }

    #[test]
    fn test_verify_and_decode() {
        let payload = execute(&generate(None, ""), &config()).unwrap();
        let verified = execute(&Command::Verify { payload: format!("{payload}\n") }, &config());
        assert_eq!(verified.unwrap(), "ok");

        let decoded = execute(&Command::Decode { payload: payload.clone() }, &config()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(json["beneficiary_key"], "test@pagamentos.com");
        assert_eq!(json["reference_label"], "");
        assert!(json.get("amount").is_none());

        let tampered = payload.replace("SAO PAULO", "SAO PAULA");
        let err = execute(&Command::Verify { payload: tampered }, &config()).unwrap_err();
        assert!(matches!(err, RunError::Checksum(_)));
    }

    #[test]
    fn test_charge_outputs_json() {
        let command = Command::Charge {
            id: "c-1".to_string(),
            amount: PixAmount::parse("25").unwrap(),
            description: "Pedido 9".to_string(),
        };
        let output = execute(&command, &config()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        let text = json["qr_code_text"].as_str().unwrap();
        assert!(verify(text).is_ok());
        assert!(
            json["qr_code"]
                .as_str()
                .unwrap()
                .starts_with("https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=000201")
        );
        assert_eq!(json["pix_code"].as_str().unwrap().len(), 32);
    }
}
