use snowflake::SnowflakeIdBucket;
use std::sync::Mutex;

static ID_GENERATOR: Mutex<Option<SnowflakeIdBucket>> = Mutex::new(None);

/// Configure the Snowflake generator used for user and scan record ids.
///
/// `machine_id` and `node_id` must both be in `0..32`. Calling this again
/// replaces the bucket, which is harmless in tests.
pub fn init(machine_id: i32, node_id: i32) {
    let mut generator = ID_GENERATOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *generator = Some(SnowflakeIdBucket::new(machine_id, node_id));
}

/// Next record id as a decimal string. Falls back to machine 1 / node 1 when
/// [`init`] was never called.
pub fn next_id() -> String {
    let mut generator = ID_GENERATOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    generator
        .get_or_insert_with(|| SnowflakeIdBucket::new(1, 1))
        .get_id()
        .to_string()
}
