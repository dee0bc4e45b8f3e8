use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AttendanceStatus {
    #[default]
    NotYet,
    Attended,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LessonComments {
    #[serde(default)]
    pub posture_comment: Option<String>,
    #[serde(default)]
    pub fingering_comment: Option<String>,
    #[serde(default)]
    pub pedal_comment: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl LessonComments {
    pub fn is_empty(&self) -> bool {
        [
            &self.posture_comment,
            &self.fingering_comment,
            &self.pedal_comment,
            &self.comment,
        ]
        .iter()
        .all(|c| c.as_deref().map_or(true, |c| c.trim().is_empty()))
    }
}

/// Attendance of one student in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(flatten)]
    pub comments: LessonComments,
    #[serde(
        default,
        rename = "imageUrls",
        deserialize_with = "image_urls",
        serialize_with = "encode_image_urls"
    )]
    pub images: Vec<String>,
}

impl AttendanceRecord {
    pub fn new(student_id: &str, status: AttendanceStatus) -> Self {
        AttendanceRecord {
            student_id: student_id.to_string(),
            student_name: String::new(),
            status,
            comments: LessonComments::default(),
            images: Vec::new(),
        }
    }
}

/// The backend stores feedback images as a JSON-encoded list. Anything that does
/// not parse as one is kept as a single url.
pub fn parse_image_urls(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(urls) => urls,
        Err(_) => vec![raw.to_string()],
    }
}

fn image_urls<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::String(raw) => parse_image_urls(&raw),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(url) => url,
                other => other.to_string(),
            })
            .collect(),
        other => vec![other.to_string()],
    })
}

fn encode_image_urls<S>(images: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let encoded = serde_json::to_string(images).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&encoded)
}
