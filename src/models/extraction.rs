//! 抓取结果模型

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// 数据类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataCategory {
    Semester,
    Attendance,
    Course,
    Marks,
    Cgpa,
    ExamSchedule,
}

impl DataCategory {
    /// 依赖学期 ID 的五个类别，按执行顺序排列
    pub const SCRAPED: [DataCategory; 5] = [
        DataCategory::Attendance,
        DataCategory::Course,
        DataCategory::Marks,
        DataCategory::Cgpa,
        DataCategory::ExamSchedule,
    ];

    /// 结果中的键名
    pub fn key(self) -> &'static str {
        match self {
            DataCategory::Semester => "semester",
            DataCategory::Attendance => "Attendance",
            DataCategory::Course => "Course",
            DataCategory::Marks => "Marks",
            DataCategory::Cgpa => "CGPA",
            DataCategory::ExamSchedule => "ExamSchedule",
        }
    }
}

/// 一次请求的抓取结果
///
/// 抓取失败或返回 null 的类别不会出现在结果里。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExtractionResult {
    entries: Map<String, JsonValue>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: DataCategory, value: JsonValue) {
        self.entries.insert(category.key().to_string(), value);
    }

    pub fn get(&self, category: DataCategory) -> Option<&JsonValue> {
        self.entries.get(category.key())
    }

    pub fn contains(&self, category: DataCategory) -> bool {
        self.entries.contains_key(category.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn into_json(self) -> JsonValue {
        JsonValue::Object(self.entries)
    }
}

/// 学期列表脚本的返回值
#[derive(Debug, Clone, PartialEq)]
pub struct SemesterRecord(JsonValue);

impl SemesterRecord {
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// 读取 `semesters[index].id`
    ///
    /// 列表缺失、下标越界或没有 `id` 时返回 `None`。数字 ID 按十进制文本返回。
    pub fn semester_id(&self, index: usize) -> Option<String> {
        let id = self.0.get("semesters")?.get(index)?.get("id")?;
        match id {
            JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn into_json(self) -> JsonValue {
        self.0
    }
}

/// 返回值是否带有实际内容
///
/// `null`、`false`、`0`、空字符串、空数组、空对象都算没有内容。
pub fn has_content(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn semester_id_reads_requested_entry() {
        let record = SemesterRecord::new(json!({
            "semesters": [{"id": "VL20242505", "name": "Winter"}, {"id": 2024}]
        }));
        assert_eq!(record.semester_id(0).as_deref(), Some("VL20242505"));
        assert_eq!(record.semester_id(1).as_deref(), Some("2024"));
    }

    #[test]
    fn semester_id_degrades_to_none() {
        let record = SemesterRecord::new(json!({"semesters": [{"name": "no id"}]}));
        assert_eq!(record.semester_id(0), None);
        assert_eq!(record.semester_id(5), None);
        assert_eq!(SemesterRecord::new(json!("plain text")).semester_id(0), None);
        assert_eq!(SemesterRecord::new(json!({"semesters": {}})).semester_id(0), None);
    }

    #[test]
    fn extraction_result_serializes_as_flat_map() {
        let mut result = ExtractionResult::new();
        result.insert(DataCategory::Cgpa, json!({"cgpa": 9.1}));
        result.insert(DataCategory::Semester, json!({"semesters": []}));
        assert_eq!(result.len(), 2);
        assert!(result.contains(DataCategory::Cgpa));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["CGPA"]["cgpa"], json!(9.1));
        assert!(value.get("semester").is_some());
    }

    #[test]
    fn empty_values_have_no_content() {
        assert!(!has_content(&json!(null)));
        assert!(!has_content(&json!("")));
        assert!(!has_content(&json!(0)));
        assert!(!has_content(&json!(false)));
        assert!(!has_content(&json!([])));
        assert!(!has_content(&json!({})));
        assert!(has_content(&json!("x")));
        assert!(has_content(&json!([0])));
        assert!(has_content(&json!({"semesters": []})));
    }
}
