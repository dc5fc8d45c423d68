//! Exclusive ownership of the dialog and the overlay mask

use crate::collaborators::{Dialog, DialogContent};
use crate::{Error, Result};
use ivid_core::Position;
use std::collections::BTreeSet;

/// Wraps the dialog so that only one interaction holds it at a time.
///
/// The overlay mask stays open while at least one interaction requests it.
#[derive(Debug)]
pub struct ModalSlot<D: Dialog> {
    dialog: D,
    holder: Option<usize>,
    overlay_requests: BTreeSet<usize>,
}

impl<D: Dialog> ModalSlot<D> {
    pub fn new(dialog: D) -> Self {
        Self {
            dialog,
            holder: None,
            overlay_requests: BTreeSet::new(),
        }
    }

    /// Interaction currently holding the dialog
    pub fn holder(&self) -> Option<usize> {
        self.holder
    }

    pub fn is_masked(&self) -> bool {
        !self.overlay_requests.is_empty()
    }

    /// Opens the dialog for an interaction, failing if another one holds it
    pub fn open(&mut self, content: &DialogContent, anchor: Position) -> Result<()> {
        match self.holder {
            Some(holder) if holder == content.interaction => return Ok(()),
            Some(holder) => return Err(Error::DialogBusy { holder }),
            None => {}
        }
        self.show(content, anchor);
        Ok(())
    }

    /// Opens the dialog for a required interaction, taking it from any other holder
    pub fn force_open(&mut self, content: &DialogContent, anchor: Position) {
        match self.holder {
            Some(holder) if holder == content.interaction => {}
            Some(_) => {
                self.dialog.close();
                self.show(content, anchor);
            }
            None => self.show(content, anchor),
        }
        self.dialog.hide_close_button();
    }

    fn show(&mut self, content: &DialogContent, anchor: Position) {
        let size = anchor.width.zip(anchor.height);
        self.dialog.open(content);
        self.dialog.position(anchor, size);
        self.holder = Some(content.interaction);
    }

    /// Closes the dialog if `index` holds it
    pub fn close(&mut self, index: usize) -> bool {
        if self.holder == Some(index) {
            self.dialog.close();
            self.holder = None;
            true
        } else {
            false
        }
    }

    /// Closes the dialog whoever holds it
    pub fn close_any(&mut self) -> Option<usize> {
        let holder = self.holder.take();
        if holder.is_some() {
            self.dialog.close();
        }
        holder
    }

    pub fn request_overlay(&mut self, index: usize) {
        if self.overlay_requests.is_empty() {
            self.dialog.open_overlay();
            self.dialog.set_overlay_disabled(true);
        }
        self.overlay_requests.insert(index);
    }

    pub fn release_overlay(&mut self, index: usize) {
        if self.overlay_requests.remove(&index) && self.overlay_requests.is_empty() {
            self.dialog.set_overlay_disabled(false);
            self.dialog.close_overlay();
        }
    }

    /// Shows the warning mask
    pub fn warn(&mut self, message: &str) {
        self.dialog.show_warning(message);
    }

    pub fn dialog(&self) -> &D {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut D {
        &mut self.dialog
    }
}
