//! Field adapters for `#[serde(with = "...")]`.

/// `u128` as a decimal string.
///
/// Internally tagged enums buffer their content before dispatch, and that
/// buffer has no `u128` slot.
pub mod decimal_u128 {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Write the value as a decimal string
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    #[allow(clippy::trivially_copy_pass_by_ref)] // signature fixed by serde
    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    /// Read a decimal string
    ///
    /// # Errors
    ///
    /// Fails if the input is not a string or not a decimal `u128`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
