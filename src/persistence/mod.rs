// Copyright (c) 2025 - Cowboy AI, Inc.
//! Persistence: object storage for artifacts, document storage for entities
//!
//! ```text
//! HierarchyStore / RegistryManager ──▶ DocumentStore   (entity collections)
//! TerragruntService ──▶ PersistenceGateway ──▶ ObjectStore   (artifacts)
//! ```

pub mod document_store;
pub mod gateway;
pub mod object_store;

pub use document_store::{
    collections, load_typed, save_typed, DocumentStore, InMemoryDocumentStore,
    JsonFileDocumentStore,
};
pub use gateway::{PersistenceGateway, UploadReceipt};
pub use object_store::{
    BucketCreation, FileSystemObjectStore, InMemoryObjectStore, ObjectStore, ObjectStoreError,
    PutRecord,
};
