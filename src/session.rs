use crate::document::Document;
use crate::domain::SubjectId;
use crate::error::DashError;
use crate::render::{self, RenderOptions, RenderPlan};

/// Interactive selection over the subjects of one document.
///
/// Each selection change is followed by a synchronous [`Session::plan`], so a
/// plan always describes the subject that is selected when it is drawn.
#[derive(Debug)]
pub struct Session<'a> {
    document: &'a Document,
    options: RenderOptions,
    index: usize,
}

impl<'a> Session<'a> {
    pub fn new(
        document: &'a Document,
        options: RenderOptions,
        initial: Option<&SubjectId>,
    ) -> Result<Self, DashError> {
        if document.names.is_empty() {
            return Err(DashError::EmptyDocument);
        }
        let index = match initial {
            Some(id) => position(document, id)?,
            None => 0,
        };
        Ok(Self {
            document,
            options,
            index,
        })
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn subjects(&self) -> &'a [SubjectId] {
        &self.document.names
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &'a SubjectId {
        &self.document.names[self.index]
    }

    pub fn select(&mut self, id: &SubjectId) -> Result<(), DashError> {
        self.index = position(self.document, id)?;
        Ok(())
    }

    pub fn select_next(&mut self) {
        self.index = (self.index + 1) % self.document.names.len();
    }

    pub fn select_previous(&mut self) {
        let len = self.document.names.len();
        self.index = (self.index + len - 1) % len;
    }

    pub fn select_first(&mut self) {
        self.index = 0;
    }

    pub fn select_last(&mut self) {
        self.index = self.document.names.len() - 1;
    }

    pub fn plan(&self) -> Result<RenderPlan, DashError> {
        render::render(self.document, self.current(), &self.options)
    }
}

fn position(document: &Document, id: &SubjectId) -> Result<usize, DashError> {
    document
        .names
        .iter()
        .position(|name| name == id)
        .ok_or_else(|| DashError::SubjectNotFound {
            kind: "name",
            id: id.to_string(),
        })
}
