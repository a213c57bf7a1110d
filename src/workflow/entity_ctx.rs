//! 实体处理上下文
//!
//! 封装"我正在处理第几个实体"这一信息

use std::fmt::Display;

/// 实体处理上下文
#[derive(Debug, Clone)]
pub struct EntityCtx {
    /// 在输入中的位置（从 0 开始，决定输出顺序）
    pub index: usize,

    /// 本批实体总数
    pub total: usize,

    /// 实体名称
    pub entity: String,
}

impl EntityCtx {
    pub fn new(index: usize, total: usize, entity: impl Into<String>) -> Self {
        Self {
            index,
            total,
            entity: entity.into(),
        }
    }
}

impl Display for EntityCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[实体 {}/{} {}]", self.index + 1, self.total, self.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_one_based() {
        let ctx = EntityCtx::new(1, 4, "Acme");

        assert_eq!(ctx.to_string(), "[实体 2/4 Acme]");
    }
}
