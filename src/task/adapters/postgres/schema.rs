//! Diesel schema for task persistence.

diesel::table! {
    /// Task records with pairing, review state, and concurrency metadata.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Task description.
        description -> Text,
        /// Workflow role.
        #[max_length = 50]
        role -> Varchar,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Assignee reference.
        assignee_id -> Uuid,
        /// Creator reference.
        creator_id -> Uuid,
        /// Paired task identifier, when linked.
        linked_task_id -> Nullable<Uuid>,
        /// Whether completion requires manager validation.
        needs_validation -> Bool,
        /// Review state payload, including returned feedback.
        review_state -> Jsonb,
        /// Completion percentage (0-100).
        progress -> Int2,
        /// Checklist payload.
        subtasks -> Jsonb,
        /// Optimistic-concurrency version counter.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last mutation timestamp.
        updated_at -> Timestamptz,
    }
}
