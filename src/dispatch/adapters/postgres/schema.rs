//! Diesel schema for delivery dispatch persistence.

diesel::table! {
    /// Delivery task records.
    delivery_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Order reference.
        #[max_length = 64]
        order_id -> Varchar,
        /// Lifecycle status.
        #[max_length = 32]
        status -> Varchar,
        /// Delivery method in storage form.
        #[max_length = 64]
        method -> Varchar,
        /// Route code for self-delivery.
        #[max_length = 32]
        route_code -> Nullable<Varchar>,
        /// Planned delivery date.
        planned_date -> Date,
        /// Assigned vehicle.
        #[max_length = 32]
        vehicle_id -> Nullable<Varchar>,
        /// Assigned driver.
        #[max_length = 32]
        driver_id -> Nullable<Varchar>,
        /// Carrier tracking number.
        #[max_length = 64]
        tracking_number -> Nullable<Varchar>,
        /// Whether the task blocks a new task for its order.
        is_active -> Bool,
        /// When the next carrier pickup attempt is due.
        next_pickup_at -> Nullable<Timestamptz>,
        /// Full task body.
        record -> Jsonb,
        /// Optimistic concurrency version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Transactional outbox of delivery events.
    delivery_outbox (seq) {
        /// Insertion order.
        seq -> Int8,
        /// Event identifier.
        id -> Uuid,
        /// Event topic.
        #[max_length = 64]
        kind -> Varchar,
        /// Task the event concerns, if any.
        task_id -> Nullable<Uuid>,
        /// Consumer deduplication key.
        #[max_length = 64]
        dedup_key -> Varchar,
        /// Serialized event.
        payload -> Jsonb,
        /// When the change happened.
        occurred_at -> Timestamptz,
        /// When the relay published the event.
        published_at -> Nullable<Timestamptz>,
    }
}
