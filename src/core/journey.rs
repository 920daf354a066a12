use crate::utils::error::{PermissionsError, Result};

/// Characters separating the journey name from its stages, and stages from
/// each other. Neither is escaped: names and stage hashes must not contain them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JourneySeparators {
    name: char,
    stage: char,
}

impl JourneySeparators {
    pub fn new(name: char, stage: char) -> Result<Self> {
        if name == stage {
            return Err(PermissionsError::InvalidConfigValueError {
                field: "journey.stage_separator".to_string(),
                value: stage.to_string(),
                reason: "Name and stage separators must differ".to_string(),
            });
        }
        Ok(Self { name, stage })
    }

    pub fn name(&self) -> char {
        self.name
    }

    pub fn stage(&self) -> char {
        self.stage
    }
}

impl Default for JourneySeparators {
    fn default() -> Self {
        Self {
            name: '_',
            stage: '|',
        }
    }
}

/// Named, append-only history of stage hashes. The last entry is the current stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    name: String,
    history: Vec<String>,
}

impl Journey {
    pub fn create(name: impl Into<String>, initial_stage: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PermissionsError::InvalidJourney {
                message: "journey name cannot be blank".to_string(),
            });
        }

        Ok(Self {
            name,
            history: vec![initial_stage.into()],
        })
    }

    /// 還原序列化的 journey；空白或缺少字串代表尚未開始，回傳 `None`
    pub fn parse(serialized: Option<&str>, separators: &JourneySeparators) -> Result<Option<Self>> {
        let serialized = match serialized {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Ok(None),
        };

        let (name, stages) = serialized.split_once(separators.name).ok_or_else(|| {
            PermissionsError::JourneyFormat {
                message: format!("missing name separator '{}'", separators.name),
            }
        })?;

        let history: Vec<String> = stages.split(separators.stage).map(str::to_string).collect();
        tracing::debug!("Parsed journey '{}' with {} stage(s)", name, history.len());

        Ok(Some(Self {
            name: name.to_string(),
            history,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn current_stage(&self) -> &str {
        // create 和 parse 都保證至少一個 stage
        self.history.last().map(String::as_str).unwrap_or_default()
    }

    pub fn advance(&mut self, stage_hash: impl Into<String>) {
        self.history.push(stage_hash.into());
    }

    pub fn serialize(&self, separators: &JourneySeparators) -> String {
        let mut stage_separator = [0u8; 4];
        let stage_separator: &str = separators.stage.encode_utf8(&mut stage_separator);

        format!(
            "{}{}{}",
            self.name,
            separators.name,
            self.history.join(stage_separator)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_fresh_journey() {
        let separators = JourneySeparators::default();
        let journey = Journey::create("J", "s0").unwrap();

        let serialized = journey.serialize(&separators);
        let restored = Journey::parse(Some(serialized.as_str()), &separators)
            .unwrap()
            .unwrap();

        assert_eq!(restored.name(), "J");
        assert_eq!(restored.current_stage(), "s0");
        assert_eq!(restored, journey);
    }

    #[test]
    fn test_advance_is_append_only() {
        let mut journey = Journey::create("J", "s0").unwrap();
        journey.advance("s1");
        journey.advance("s2");

        assert_eq!(journey.current_stage(), "s2");
        assert_eq!(journey.history(), ["s0", "s1", "s2"]);
    }

    #[test]
    fn test_serialize_example() {
        let separators = JourneySeparators::default();
        let mut journey = Journey::create("apply-ogel", "start").unwrap();
        journey.advance("review");

        let serialized = journey.serialize(&separators);
        assert_eq!(serialized, "apply-ogel_start|review");

        let restored = Journey::parse(Some(serialized.as_str()), &separators).unwrap();
        assert_eq!(restored, Some(journey));
    }

    #[test]
    fn test_blank_input_is_absent() {
        let separators = JourneySeparators::default();
        assert_eq!(Journey::parse(None, &separators).unwrap(), None);
        assert_eq!(Journey::parse(Some(""), &separators).unwrap(), None);
        assert_eq!(Journey::parse(Some("  \t"), &separators).unwrap(), None);
    }

    #[test]
    fn test_missing_name_separator_is_format_error() {
        let result = Journey::parse(Some("noSeparatorHere"), &JourneySeparators::default());
        assert!(matches!(result, Err(PermissionsError::JourneyFormat { .. })));
    }

    #[test]
    fn test_name_split_only_once() {
        let separators = JourneySeparators::default();
        let journey = Journey::parse(Some("apply_a_b|c"), &separators).unwrap().unwrap();

        assert_eq!(journey.name(), "apply");
        assert_eq!(journey.history(), ["a_b", "c"]);
    }

    #[test]
    fn test_empty_stages_are_kept() {
        let separators = JourneySeparators::default();
        let journey = Journey::parse(Some("J_"), &separators).unwrap().unwrap();
        assert_eq!(journey.history(), [""]);
        assert_eq!(journey.current_stage(), "");

        let trailing = Journey::parse(Some("J_a|"), &separators).unwrap().unwrap();
        assert_eq!(trailing.serialize(&separators), "J_a|");
    }

    #[test]
    fn test_custom_separators() {
        let separators = JourneySeparators::new('~', ',').unwrap();
        let mut journey = Journey::create("export", "a1").unwrap();
        journey.advance("b2");

        assert_eq!(journey.serialize(&separators), "export~a1,b2");
        assert!(JourneySeparators::new('_', '_').is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(matches!(
            Journey::create("  ", "s0"),
            Err(PermissionsError::InvalidJourney { .. })
        ));
    }
}
