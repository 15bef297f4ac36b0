use crate::models::{ProjectCreate, TaskCreate, TaskStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    /// Fixed options cycled with left/right instead of typed.
    Choice(Vec<&'static str>),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
    /// Cursor position in chars.
    pub cursor: usize,
}

impl Field {
    pub fn text(label: &'static str, value: &str) -> Self {
        Field {
            label,
            value: value.to_string(),
            kind: FieldKind::Text,
            cursor: value.chars().count(),
        }
    }

    pub fn choice(label: &'static str, options: Vec<&'static str>, value: &str) -> Self {
        Field {
            label,
            value: value.to_string(),
            kind: FieldKind::Choice(options),
            cursor: 0,
        }
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert_char(&mut self, c: char) {
        if self.kind != FieldKind::Text {
            return;
        }
        let at = self.byte_index();
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.kind != FieldKind::Text || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.value.remove(at);
    }

    pub fn move_left(&mut self) {
        match &self.kind {
            FieldKind::Text => self.cursor = self.cursor.saturating_sub(1),
            FieldKind::Choice(_) => self.step_choice(-1),
        }
    }

    pub fn move_right(&mut self) {
        match &self.kind {
            FieldKind::Text => {
                if self.cursor < self.value.chars().count() {
                    self.cursor += 1;
                }
            }
            FieldKind::Choice(_) => self.step_choice(1),
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    fn step_choice(&mut self, step: isize) {
        let FieldKind::Choice(options) = &self.kind else {
            return;
        };
        if options.is_empty() {
            return;
        }
        let current = options.iter().position(|o| *o == self.value).unwrap_or(0) as isize;
        let len = options.len() as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.value = options[next].to_string();
    }

    /// Value split around the cursor, for drawing it.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.value.split_at(self.byte_index())
    }
}

/// A dialog of single-line fields with one focused field.
#[derive(Debug, Clone)]
pub struct Form {
    pub title: String,
    pub fields: Vec<Field>,
    pub focused: usize,
}

impl Form {
    pub fn project(payload: &ProjectCreate) -> Self {
        Form {
            title: "Create New Project".to_string(),
            fields: vec![
                Field::text("Name", &payload.name),
                Field::text("Description", payload.description.as_deref().unwrap_or("")),
            ],
            focused: 0,
        }
    }

    pub fn task(project_name: &str, payload: &TaskCreate) -> Self {
        let statuses = TaskStatus::ALL.iter().map(|s| s.as_str()).collect();
        Form {
            title: format!("Create New Task in {}", project_name),
            fields: vec![
                Field::text("Title", &payload.title),
                Field::text("Description", payload.description.as_deref().unwrap_or("")),
                Field::text("Start Date", &payload.start_date),
                Field::text("End Date", &payload.end_date),
                Field::choice("Status", statuses, payload.status.as_str()),
            ],
            focused: 0,
        }
    }

    pub fn focused_field(&mut self) -> &mut Field {
        &mut self.fields[self.focused]
    }

    pub fn next_field(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len();
    }

    pub fn previous_field(&mut self) {
        self.focused = if self.focused == 0 {
            self.fields.len() - 1
        } else {
            self.focused - 1
        };
    }

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    pub fn apply_to_project(&self, payload: &mut ProjectCreate) {
        payload.name = self.value("Name").to_string();
        payload.description = Some(self.value("Description").to_string());
    }

    pub fn apply_to_task(&self, payload: &mut TaskCreate) {
        payload.title = self.value("Title").to_string();
        payload.description = Some(self.value("Description").to_string());
        payload.start_date = self.value("Start Date").to_string();
        payload.end_date = self.value("End Date").to_string();
        if let Some(status) = TaskStatus::parse(self.value("Status")) {
            payload.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::blank_task;
    use chrono::NaiveDate;

    #[test]
    fn typing_respects_cursor_position() {
        let mut field = Field::text("Name", "Lanch");
        field.move_left();
        field.move_left();
        field.move_left();
        field.insert_char('u');
        assert_eq!(field.value, "Launch");

        field.move_end();
        field.delete_char();
        assert_eq!(field.value, "Launc");

        field.move_home();
        field.delete_char();
        assert_eq!(field.value, "Launc");
    }

    #[test]
    fn multibyte_text_edits_by_char() {
        let mut field = Field::text("Name", "café");
        field.delete_char();
        assert_eq!(field.value, "caf");
        field.insert_char('é');
        field.move_left();
        assert_eq!(field.split_at_cursor(), ("caf", "é"));
    }

    #[test]
    fn choice_field_cycles_and_ignores_typing() {
        let mut form = Form::task("Launch", &blank_task(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        form.previous_field();
        let status = form.focused_field();
        assert_eq!(status.label, "Status");

        status.insert_char('x');
        assert_eq!(status.value, "TODO");
        status.move_right();
        assert_eq!(status.value, "IN_PROGRESS");
        status.move_left();
        status.move_left();
        assert_eq!(status.value, "DONE");
    }

    #[test]
    fn task_form_writes_back_payload() {
        let mut payload = blank_task(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let mut form = Form::task("Launch", &payload);
        for c in "Draft".chars() {
            form.focused_field().insert_char(c);
        }
        form.next_field();
        form.next_field();
        form.next_field();
        form.next_field();
        form.focused_field().move_right();

        form.apply_to_task(&mut payload);
        assert_eq!(payload.title, "Draft");
        assert_eq!(payload.start_date, "2024-01-01");
        assert_eq!(payload.end_date, "2024-01-08");
        assert_eq!(payload.status, TaskStatus::InProgress);
    }

    #[test]
    fn project_form_round_trips_values() {
        let mut payload = ProjectCreate {
            name: "Launch".to_string(),
            description: None,
        };
        let mut form = Form::project(&payload);
        form.next_field();
        for c in "Q1".chars() {
            form.focused_field().insert_char(c);
        }

        form.apply_to_project(&mut payload);
        assert_eq!(payload.name, "Launch");
        assert_eq!(payload.description.as_deref(), Some("Q1"));
    }
}
