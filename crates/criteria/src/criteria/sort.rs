use crate::{
    ast::common::{NullPrecedence, OrderDir},
    criteria::{Criteria, Target},
    error::Result,
    node::SortSpec,
};
use model::core::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOptions {
    pub direction: OrderDir,
    pub ignore_case: bool,
    pub nulls: NullPrecedence,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self::asc()
    }
}

impl SortOptions {
    pub fn asc() -> Self {
        Self {
            direction: OrderDir::Asc,
            ignore_case: false,
            nulls: NullPrecedence::None,
        }
    }

    pub fn desc() -> Self {
        Self {
            direction: OrderDir::Desc,
            ..Self::asc()
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullPrecedence::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullPrecedence::Last;
        self
    }
}

/// ORDER BY. Entries keep call order and are never de-duplicated.
pub trait Sortable<E> {
    fn sort_column(&self, target: Target<E>, options: SortOptions) -> Result<&Self>;

    fn sort(&self, target: impl Into<Target<E>>, options: SortOptions) -> Result<&Self> {
        self.sort_column(target.into(), options)
    }

    fn col_asc(&self, target: impl Into<Target<E>>) -> Result<&Self> {
        self.sort_column(target.into(), SortOptions::asc())
    }

    fn col_desc(&self, target: impl Into<Target<E>>) -> Result<&Self> {
        self.sort_column(target.into(), SortOptions::desc())
    }

    fn cols_asc<I, T>(&self, targets: I) -> Result<&Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Target<E>>,
    {
        for target in targets {
            self.sort_column(target.into(), SortOptions::asc())?;
        }
        Ok(self)
    }

    fn cols_desc<I, T>(&self, targets: I) -> Result<&Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Target<E>>,
    {
        for target in targets {
            self.sort_column(target.into(), SortOptions::desc())?;
        }
        Ok(self)
    }
}

impl<E: Entity> Sortable<E> for Criteria<E> {
    fn sort_column(&self, target: Target<E>, options: SortOptions) -> Result<&Self> {
        let spec = SortSpec {
            column: self.column(target)?,
            direction: options.direction,
            ignore_case: options.ignore_case,
            nulls: options.nulls,
        };
        Ok(self.update(|node| node.order_by.push(spec)))
    }
}
