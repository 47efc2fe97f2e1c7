use chrono::Local;

/// Timestamp pattern shared by the form (writer) and the summary (reader).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The fixed set of mood categories a team member can log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Happy,
    Frustrating,
    Confusing,
    Neutral,
    Satisfied,
}

impl Mood {
    /// Form ordering, first option selected by default.
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Frustrating,
        Mood::Confusing,
        Mood::Neutral,
        Mood::Satisfied,
    ];

    /// Display label shown in the form.
    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "😊 Happy",
            Mood::Frustrating => "😠 Frustrating",
            Mood::Confusing => "😕 Confusing",
            Mood::Neutral => "😐 Neutral",
            Mood::Satisfied => "🎉 Satisfied",
        }
    }

    /// Stored tag: the leading glyph of the display label.
    pub fn tag(self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Frustrating => "😠",
            Mood::Confusing => "😕",
            Mood::Neutral => "😐",
            Mood::Satisfied => "🎉",
        }
    }
}

/// One logged mood. Created once at submission, never mutated.
#[derive(Debug, Clone)]
pub struct MoodEntry {
    pub timestamp: String,
    pub mood: Mood,
    pub note: String,
}

impl MoodEntry {
    /// Stamps the entry with the current local wall-clock time.
    pub fn now(mood: Mood, note: String) -> Self {
        MoodEntry {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            mood,
            note,
        }
    }

    /// Cell values in the sheet's column order: Timestamp, Mood, Note.
    pub fn row(&self) -> [String; 3] {
        [
            self.timestamp.clone(),
            self.mood.tag().to_string(),
            self.note.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn tag_is_leading_glyph_of_label() {
        for mood in Mood::ALL {
            assert_eq!(mood.label().split_whitespace().next(), Some(mood.tag()));
        }
    }

    #[test]
    fn row_stores_tag_not_label() {
        let entry = MoodEntry::now(Mood::Happy, String::new());
        let row = entry.row();
        assert_eq!(row[1], "😊");
        assert_eq!(row[2], "");
    }

    #[test]
    fn timestamp_round_trips_through_shared_format() {
        let entry = MoodEntry::now(Mood::Satisfied, "ship it".to_string());
        assert!(NaiveDateTime::parse_from_str(&entry.timestamp, TIMESTAMP_FORMAT).is_ok());
    }
}
