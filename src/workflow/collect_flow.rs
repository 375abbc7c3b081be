//! 数据抓取流程 - 流程层
//!
//! 登录后先取学期列表、选出学期 ID，再依次执行五个类别脚本。
//! 单个脚本失败不影响其他类别。

use tracing::{info, warn};

use crate::infrastructure::PortalPage;
use crate::models::extraction::has_content;
use crate::models::{DataCategory, ExtractionResult, SemesterRecord, SemesterSelection};
use crate::scripts::{PageScript, ScriptParams, ScriptRegistry};
use crate::utils::logging::truncate_text;

pub struct CollectFlow<'a> {
    registry: &'a ScriptRegistry,
}

impl<'a> CollectFlow<'a> {
    pub fn new(registry: &'a ScriptRegistry) -> Self {
        Self { registry }
    }

    pub async fn run(&self, page: &dyn PortalPage, selection: SemesterSelection) -> ExtractionResult {
        let mut result = ExtractionResult::new();

        // ========== 第一步：学期列表 ==========
        let sem_id = self.collect_semesters(page, selection, &mut result).await;

        // ========== 第二步：五个类别，顺序执行 ==========
        let params = ScriptParams::with_sem_id(sem_id.as_deref());
        for (category, script) in self.registry.categories() {
            match script.execute(page, params).await {
                Some(value) => {
                    info!(
                        "✓ {} 抓取完成: {}",
                        category.key(),
                        truncate_text(&value.to_string(), 80)
                    );
                    result.insert(*category, value);
                }
                None => warn!("⚠️ {} 没有返回数据", category.key()),
            }
        }

        result
    }

    /// 执行学期列表脚本，返回选中的学期 ID
    async fn collect_semesters(
        &self,
        page: &dyn PortalPage,
        selection: SemesterSelection,
        result: &mut ExtractionResult,
    ) -> Option<String> {
        let value = self
            .registry
            .semester_list()
            .execute(page, ScriptParams::default())
            .await
            .filter(has_content);

        let Some(value) = value else {
            warn!("⚠️ 获取学期数据失败");
            return None;
        };

        let record = SemesterRecord::new(value);
        let sem_id = record.semester_id(selection.sem_index);
        match &sem_id {
            Some(id) => info!("📅 使用第 {} 个学期: {}", selection.sem_index, id),
            None => warn!(
                "⚠️ 无法按下标 {} 取得学期 ID，后续脚本不带学期参数",
                selection.sem_index
            ),
        }
        result.insert(DataCategory::Semester, record.into_json());
        sem_id
    }
}
