//! 脚本注册表
//!
//! 进程启动时一次性从目录加载全部脚本，缺任何一个都直接启动失败。之后只读。

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::ConfigError;
use crate::models::DataCategory;
use crate::scripts::{CaptchaSolver, ExtractionScript};

/// 注册表键名 → 文件名
pub static SCRIPT_FILES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "captcha_solver" => "captchasolver.js",
    "semester" => "scraper.js",
    "Attendance" => "Attendancescraper.js",
    "Course" => "Coursescraper.js",
    "Marks" => "Marksscraper.js",
    "CGPA" => "CGPAscraper.js",
    "ExamSchedule" => "ExamSchedulescraper.js",
};

/// 验证码脚本的键名
pub const CAPTCHA_SOLVER_KEY: &str = "captcha_solver";

#[derive(Debug, Clone)]
pub struct ScriptRegistry {
    captcha_solver: CaptchaSolver,
    semester_list: ExtractionScript,
    categories: Vec<(DataCategory, ExtractionScript)>,
}

impl ScriptRegistry {
    /// 从目录加载全部脚本
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        info!("📜 正在加载脚本目录: {}", dir.display());

        let mut sources = HashMap::new();
        for key in required_keys() {
            let path = dir.join(SCRIPT_FILES[key]);
            if !path.is_file() {
                return Err(ConfigError::MissingScript {
                    name: key.to_string(),
                    path: path.display().to_string(),
                });
            }
            let body = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?;
            debug!("已加载 {} ({} 字节)", key, body.len());
            sources.insert(key.to_string(), body);
        }

        let registry = Self::from_sources(sources)?;
        info!("✓ 已加载 {} 个脚本", registry.categories.len() + 2);
        Ok(registry)
    }

    /// 用内存中的脚本内容构建（键名见 `SCRIPT_FILES`）
    pub fn from_sources(mut sources: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut take = |key: &str| {
            sources.remove(key).ok_or_else(|| ConfigError::MissingScript {
                name: key.to_string(),
                path: SCRIPT_FILES.get(key).copied().unwrap_or_default().to_string(),
            })
        };

        let captcha_solver = CaptchaSolver::new(take(CAPTCHA_SOLVER_KEY)?);
        let semester_list = ExtractionScript::new(
            DataCategory::Semester.key(),
            take(DataCategory::Semester.key())?,
        );
        let categories = DataCategory::SCRAPED
            .iter()
            .map(|&category| {
                take(category.key()).map(|body| (category, ExtractionScript::new(category.key(), body)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            captcha_solver,
            semester_list,
            categories,
        })
    }

    pub fn captcha_solver(&self) -> &CaptchaSolver {
        &self.captcha_solver
    }

    pub fn semester_list(&self) -> &ExtractionScript {
        &self.semester_list
    }

    /// 五个类别脚本，按固定顺序
    pub fn categories(&self) -> &[(DataCategory, ExtractionScript)] {
        &self.categories
    }
}

fn required_keys() -> impl Iterator<Item = &'static str> {
    std::iter::once(CAPTCHA_SOLVER_KEY)
        .chain(std::iter::once(DataCategory::Semester.key()))
        .chain(DataCategory::SCRAPED.iter().map(|c| c.key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripts::PageScript;

    fn write_all(dir: &Path) {
        for (key, file) in SCRIPT_FILES.entries() {
            std::fs::write(dir.join(file), format!("/* {} */ null", key)).unwrap();
        }
    }

    #[test]
    fn loads_every_script_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());

        let registry = ScriptRegistry::load_dir(dir.path()).unwrap();
        assert!(registry.captcha_solver().body().contains("captcha_solver"));
        assert!(registry.semester_list().body().contains("semester"));
        let names: Vec<&str> = registry.categories().iter().map(|(_, s)| s.name()).collect();
        assert_eq!(names, ["Attendance", "Course", "Marks", "CGPA", "ExamSchedule"]);
    }

    #[test]
    fn missing_script_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        std::fs::remove_file(dir.path().join("Marksscraper.js")).unwrap();

        let err = ScriptRegistry::load_dir(dir.path()).unwrap_err();
        match err {
            ConfigError::MissingScript { name, path } => {
                assert_eq!(name, "Marks");
                assert!(path.ends_with("Marksscraper.js"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_sources_requires_all_keys() {
        let sources: HashMap<String, String> = [("captcha_solver", "x"), ("semester", "y")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(matches!(
            ScriptRegistry::from_sources(sources),
            Err(ConfigError::MissingScript { ref name, .. }) if name == "Attendance"
        ));
    }
}
