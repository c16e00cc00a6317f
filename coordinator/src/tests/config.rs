use crate::config::{BatchSizes, PollConfiguration, VoiceCreditModel, DEFAULT_DEACTIVATION_QUEUE_SIZE};
use crate::error::{Error, InputError};
use crate::tests::{get_coordinator, get_poll_config};

/// Batch sizes follow the tree depths.
#[test]
fn batch_sizes_for_depths()
{
    let config = get_poll_config();
    assert_eq!(config.batch_sizes, BatchSizes { tally_batch_size: 5, subsidy_batch_size: 5, message_batch_size: 5 });
    assert!(config.validate().is_ok());
}

/// A configuration survives JSON and keeps its coordinator.
#[test]
fn json_round_trip()
{
    let config = get_poll_config();
    let json = config.to_json().unwrap();
    assert!(json.contains("messageTreeSubDepth"));

    let parsed = PollConfiguration::from_json(&json).unwrap();
    assert_eq!(parsed, config);
    assert_eq!(parsed.coordinator_keypair().unwrap(), get_coordinator());
}

/// Optional fields take their defaults.
#[test]
fn json_defaults()
{
    let mut value: serde_json::Value = serde_json::from_str(&get_poll_config().to_json().unwrap()).unwrap();
    let object = value.as_object_mut().unwrap();
    object.remove("voiceCreditModel");
    object.remove("deactivationQueueSize");

    let parsed = PollConfiguration::from_json(&value.to_string()).unwrap();
    assert_eq!(parsed.voice_credit_model, VoiceCreditModel::Quadratic);
    assert_eq!(parsed.deactivation_queue_size, DEFAULT_DEACTIVATION_QUEUE_SIZE);
}

/// Inconsistent parameters are rejected.
#[test]
fn invalid_configurations()
{
    let is_invalid = |config: &PollConfiguration| {
        matches!(config.validate(), Err(Error::InputValidation(InputError::InvalidConfiguration(_))))
    };

    let mut config = get_poll_config();
    config.batch_sizes.message_batch_size = 4;
    assert!(is_invalid(&config));

    let mut config = get_poll_config();
    config.tree_depths.message_tree_sub_depth = 3;
    assert!(is_invalid(&config));

    let mut config = get_poll_config();
    config.max_values.max_vote_options = 6;
    assert!(is_invalid(&config));

    let mut config = get_poll_config();
    config.max_values.max_messages = 26;
    assert!(is_invalid(&config));

    let mut config = get_poll_config();
    config.batch_sizes.tally_batch_size = 25;
    assert!(is_invalid(&config));

    let mut config = get_poll_config();
    config.coordinator_private_key = "not a number".into();
    assert!(matches!(config.validate(), Err(Error::InputValidation(InputError::InvalidDecimal(_)))));
}

/// Malformed JSON is a serialization error.
#[test]
fn malformed_json()
{
    assert!(matches!(PollConfiguration::from_json("{"), Err(Error::Serialization(_))));
}
