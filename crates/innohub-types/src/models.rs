use serde::{Deserialize, Serialize};

/// Development phase of a posted idea. Stored in the database as its
/// canonical string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdeaStage {
    Idea,
    #[serde(rename = "MVP")]
    Mvp,
    Revenue,
}

impl IdeaStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStage::Idea => "Idea",
            IdeaStage::Mvp => "MVP",
            IdeaStage::Revenue => "Revenue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Idea" => Some(IdeaStage::Idea),
            "MVP" => Some(IdeaStage::Mvp),
            "Revenue" => Some(IdeaStage::Revenue),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_roundtrip() {
        for stage in [IdeaStage::Idea, IdeaStage::Mvp, IdeaStage::Revenue] {
            assert_eq!(IdeaStage::parse(stage.as_str()), Some(stage));
        }
    }

    #[test]
    fn unknown_stage_rejected() {
        assert_eq!(IdeaStage::parse("Prototype"), None);
        assert_eq!(IdeaStage::parse(""), None);
        assert_eq!(IdeaStage::parse("mvp"), None);
    }
}
