use crossterm::event::KeyCode;

/// Selection index into a list whose length can change underneath it.
#[derive(Default, Clone, Copy)]
pub(crate) struct ListCursor {
    pub(crate) selected: usize,
}

impl ListCursor {
    pub(crate) fn move_selection(&mut self, offset: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max = len as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, max) as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    pub(crate) fn ensure_in_bounds(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Handle the shared list navigation keys. Returns false for other keys.
    pub(crate) fn navigate(&mut self, code: KeyCode, len: usize) -> bool {
        match code {
            KeyCode::Up => self.move_selection(-1, len),
            KeyCode::Down => self.move_selection(1, len),
            KeyCode::PageUp => self.move_selection(-5, len),
            KeyCode::PageDown => self.move_selection(5, len),
            KeyCode::Home => self.select_first(),
            KeyCode::End => self.select_last(len),
            _ => return false,
        }
        true
    }
}

/// Which home panel receives navigation keys.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum HomeFocus {
    #[default]
    Best,
    Collections,
}

/// Cursor state for the home dashboard.
#[derive(Default)]
pub(crate) struct HomeScreen {
    pub(crate) focus: HomeFocus,
    pub(crate) best: ListCursor,
    pub(crate) collections: ListCursor,
}

impl HomeScreen {
    pub(crate) fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            HomeFocus::Best => HomeFocus::Collections,
            HomeFocus::Collections => HomeFocus::Best,
        };
    }

    pub(crate) fn ensure_in_bounds(&mut self, best_len: usize, collections_len: usize) {
        self.best.ensure_in_bounds(best_len);
        self.collections.ensure_in_bounds(collections_len);
    }
}
