use crate::{
    criteria::{Criteria, Target},
    error::Result,
    node::SelectItem,
};
use model::core::entity::Entity;

/// Projection of plain columns.
///
/// Exclusions win over selections whatever the call order.
pub trait Selectable<E> {
    fn select_column(&self, target: Target<E>, alias: Option<&str>) -> Result<&Self>;

    fn exclude_column(&self, target: Target<E>) -> Result<&Self>;

    fn select(&self, target: impl Into<Target<E>>) -> Result<&Self> {
        self.select_column(target.into(), None)
    }

    fn select_as(&self, target: impl Into<Target<E>>, alias: &str) -> Result<&Self> {
        self.select_column(target.into(), Some(alias))
    }

    fn selects<I, T>(&self, targets: I) -> Result<&Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Target<E>>,
    {
        for target in targets {
            self.select_column(target.into(), None)?;
        }
        Ok(self)
    }

    fn exclude(&self, target: impl Into<Target<E>>) -> Result<&Self> {
        self.exclude_column(target.into())
    }

    fn exclude_all<I, T>(&self, targets: I) -> Result<&Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Target<E>>,
    {
        for target in targets {
            self.exclude_column(target.into())?;
        }
        Ok(self)
    }
}

impl<E: Entity> Selectable<E> for Criteria<E> {
    fn select_column(&self, target: Target<E>, alias: Option<&str>) -> Result<&Self> {
        let item = SelectItem::Column {
            column: self.column(target)?,
            alias: alias.map(str::to_string),
        };
        Ok(self.update(|node| {
            if !node.selected.contains(&item) {
                node.selected.push(item);
            }
        }))
    }

    fn exclude_column(&self, target: Target<E>) -> Result<&Self> {
        let column = self.column(target)?;
        Ok(self.update(|node| {
            node.excluded.insert(column.column);
        }))
    }
}
