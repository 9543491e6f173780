//! Per-task comment controller: keeps the reply tree live, tracks the
//! mention suggestion state, and issues the comment writes.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::model::TaskComment;
use crate::store::{AuthUser, CollectionRef, Document, DocumentStore, Subscription};

use super::{
    apply_mention, build_comment_tree, mention_at_caret, mention_suggestions, CommentNode,
    MentionContext,
};

#[derive(Default)]
struct PanelState {
    tree: Vec<CommentNode>,
    user_emails: Vec<String>,
    mention: Option<MentionContext>,
    suggestions: Vec<String>,
}

#[derive(Default)]
struct PanelSubs {
    comments: Option<Subscription>,
    users: Option<Subscription>,
}

/// Comment section for one task at a time.
pub struct CommentPanel {
    store: Rc<dyn DocumentStore>,
    current_user: Option<AuthUser>,
    task_id: RefCell<String>,
    state: Rc<RefCell<PanelState>>,
    subs: RefCell<PanelSubs>,
}

impl CommentPanel {
    pub fn new(store: Rc<dyn DocumentStore>, current_user: Option<AuthUser>) -> Self {
        Self {
            store,
            current_user,
            task_id: RefCell::new(String::new()),
            state: Rc::default(),
            subs: RefCell::new(PanelSubs::default()),
        }
    }

    /// Point the panel at a task: cancels any previous comment subscription,
    /// then follows the new task's comments. The users subscription (for
    /// mention suggestions) is opened once and kept.
    pub fn open(&self, task_id: &str) {
        *self.task_id.borrow_mut() = task_id.to_string();

        let old = self.subs.borrow_mut().comments.take();
        drop(old);

        let state = self.state.clone();
        let sub = self.store.subscribe(
            CollectionRef::task_comments_for(task_id),
            Rc::new(move |docs: &[Document]| {
                let comments: Vec<TaskComment> =
                    docs.iter().filter_map(Document::decode).collect();
                debug!(count = comments.len(), "comments snapshot");
                state.borrow_mut().tree = build_comment_tree(&comments);
            }),
        );
        self.subs.borrow_mut().comments = Some(sub);

        if self.subs.borrow().users.is_none() {
            let state = self.state.clone();
            let sub = self.store.subscribe(
                CollectionRef::users(),
                Rc::new(move |docs: &[Document]| {
                    state.borrow_mut().user_emails = docs
                        .iter()
                        .filter_map(|d| d.data.get("email").and_then(serde_json::Value::as_str))
                        .map(str::to_string)
                        .collect();
                }),
            );
            self.subs.borrow_mut().users = Some(sub);
        }
    }

    pub fn tree(&self) -> Vec<CommentNode> {
        self.state.borrow().tree.clone()
    }

    pub fn user_emails(&self) -> Vec<String> {
        self.state.borrow().user_emails.clone()
    }

    /// Post a top-level comment. Blank content is a no-op.
    pub fn post(&self, content: &str) -> Result<(), Error> {
        self.post_reply(content, "")
    }

    /// Post a reply under `parent_id` (empty for a root comment).
    pub fn post_reply(&self, content: &str, parent_id: &str) -> Result<(), Error> {
        if content.trim().is_empty() {
            return Ok(());
        }
        let (user_id, user_name) = match &self.current_user {
            Some(user) => (user.uid.clone(), user.email.clone()),
            None => (String::new(), String::new()),
        };
        let mut doc = json!({
            "taskId": *self.task_id.borrow(),
            "userId": user_id,
            "userName": user_name,
            "content": content,
            "createdAt": Utc::now().to_rfc3339(),
        });
        // An absent parentId marks a root; never store an empty one.
        if !parent_id.is_empty() {
            if let Some(map) = doc.as_object_mut() {
                map.insert("parentId".to_string(), json!(parent_id));
            }
        }
        self.store.add(&CollectionRef::task_comments(), doc)?;
        Ok(())
    }

    /// Delete a comment. Only the author may delete their own; anything else
    /// is a silent no-op.
    pub fn delete(&self, comment: &TaskComment) -> Result<(), Error> {
        let own = self
            .current_user
            .as_ref()
            .is_some_and(|u| u.uid == comment.user_id);
        if !own {
            return Ok(());
        }
        self.store
            .delete(&CollectionRef::task_comments(), &comment.id)?;
        Ok(())
    }

    /// Replace a comment's content.
    pub fn edit(&self, comment_id: &str, content: &str) -> Result<(), Error> {
        self.store.update(
            &CollectionRef::task_comments(),
            comment_id,
            json!({"content": content}),
        )?;
        Ok(())
    }

    // --- Mention suggestions ---

    /// Track the text being typed; updates the suggestion list.
    pub fn on_input(&self, text: &str, caret: usize) {
        let mut state = self.state.borrow_mut();
        match mention_at_caret(text, caret) {
            Some(context) => {
                state.suggestions = mention_suggestions(&state.user_emails, &context.query);
                state.mention = Some(context);
            }
            None => {
                state.mention = None;
                state.suggestions.clear();
            }
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.state.borrow().suggestions.clone()
    }

    /// Accept a suggestion: splice `@email ` into the text and clear the
    /// suggestion state. Returns the new text and caret position.
    pub fn accept_mention(&self, text: &str, caret: usize, email: &str) -> (String, usize) {
        let mut state = self.state.borrow_mut();
        let result = match state.mention.take() {
            Some(context) => apply_mention(text, &context, caret, email),
            None => (text.to_string(), caret),
        };
        state.suggestions.clear();
        result
    }
}
