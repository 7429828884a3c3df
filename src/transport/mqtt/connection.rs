//! Pure connection configuration for the MQTT transport
//!
//! Option building and protocol-code mapping live here so they can be
//! tested without touching the network.

use crate::config::{QosLevel, SessionConfig};
use rumqttc::{ConnectReturnCode, MqttOptions, QoS};
use thiserror::Error;

/// MQTT transport errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Invalid broker address: {0}")]
    InvalidAddress(String),
    #[error("Network task already running")]
    AlreadyRunning,
    #[error("No event sender registered")]
    NoEventSender,
    #[error("Transport not connected")]
    NotStarted,
    #[error("Protocol client request failed")]
    Client(#[from] rumqttc::ClientError),
}

/// Build `MqttOptions` from the session configuration.
///
/// Validates the configuration first so a malformed address fails here,
/// synchronously, instead of surfacing as a confusing network error later.
pub fn configure_mqtt_options(config: &SessionConfig) -> Result<MqttOptions, MqttError> {
    config
        .validate()
        .map_err(|e| MqttError::InvalidAddress(e.to_string()))?;

    let mut options = MqttOptions::new(
        config.effective_client_id(),
        config.broker_host.trim(),
        config.port,
    );
    options.set_keep_alive(config.keepalive());
    options.set_clean_session(true);

    Ok(options)
}

/// Map the broker's connect acknowledgment to its wire-level result code.
pub fn connack_code(code: ConnectReturnCode) -> u8 {
    match code {
        ConnectReturnCode::Success => 0,
        ConnectReturnCode::RefusedProtocolVersion => 1,
        ConnectReturnCode::BadClientId => 2,
        ConnectReturnCode::ServiceUnavailable => 3,
        ConnectReturnCode::BadUserNamePassword => 4,
        ConnectReturnCode::NotAuthorized => 5,
    }
}

/// Convert the session QoS level to the protocol library's type.
pub fn to_protocol_qos(qos: QosLevel) -> QoS {
    match qos {
        QosLevel::AtMostOnce => QoS::AtMostOnce,
        QosLevel::AtLeastOnce => QoS::AtLeastOnce,
        QosLevel::ExactlyOnce => QoS::ExactlyOnce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_mqtt_options() {
        let config = SessionConfig::new("localhost");
        let options = configure_mqtt_options(&config);
        assert!(options.is_ok());
    }

    #[test]
    fn test_configured_client_id_is_used() {
        let mut config = SessionConfig::new("localhost");
        config.client_id = Some("console-7".to_string());
        let options = configure_mqtt_options(&config).unwrap();
        assert_eq!(options.client_id(), "console-7");
    }

    #[test]
    fn test_invalid_address_rejected() {
        let config = SessionConfig::new("mqtt://localhost");
        let result = configure_mqtt_options(&config);
        assert!(matches!(result, Err(MqttError::InvalidAddress(_))));
    }

    #[test]
    fn test_connack_code_mapping() {
        assert_eq!(connack_code(ConnectReturnCode::Success), 0);
        assert_eq!(connack_code(ConnectReturnCode::RefusedProtocolVersion), 1);
        assert_eq!(connack_code(ConnectReturnCode::BadClientId), 2);
        assert_eq!(connack_code(ConnectReturnCode::ServiceUnavailable), 3);
        assert_eq!(connack_code(ConnectReturnCode::BadUserNamePassword), 4);
        assert_eq!(connack_code(ConnectReturnCode::NotAuthorized), 5);
    }

    #[test]
    fn test_qos_conversion() {
        assert_eq!(to_protocol_qos(QosLevel::AtMostOnce), QoS::AtMostOnce);
        assert_eq!(to_protocol_qos(QosLevel::AtLeastOnce), QoS::AtLeastOnce);
        assert_eq!(to_protocol_qos(QosLevel::ExactlyOnce), QoS::ExactlyOnce);
    }
}
