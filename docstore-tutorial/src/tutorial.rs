//! The tutorial steps, run in order against one collection.

use docstore::collection::{DeleteResult, InsertOneResult, UpdateResult};
use docstore::index::IndexModel;
use docstore::{doc, doc_array};
use docstore::{Collection, DocStoreResult, Document, DocumentBuilder, ErrorKind, Value};
use std::fmt::{Display, Formatter};

/// Number of `{i: n}` documents written by the bulk insert step.
pub const BULK_SIZE: i32 = 100;

/// What each step reported, for callers that want to check the run.
#[derive(Debug, Clone)]
pub struct Summary {
    pub inserted: InsertOneResult,
    pub bulk_inserted: usize,
    pub first_name: Option<String>,
    pub total_found: usize,
    pub point_query_hit: bool,
    pub range_found: usize,
    pub updated_one: UpdateResult,
    pub updated_many: UpdateResult,
    pub deleted_one: DeleteResult,
    pub deleted_many: DeleteResult,
    pub index_name: String,
    pub remaining: u64,
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inserted_id = self
            .inserted
            .inserted_id()
            .map_or_else(|| "unacknowledged".to_string(), |id| id.to_string());
        writeln!(f, "inserted one:   {}", inserted_id)?;
        writeln!(f, "bulk inserted:  {}", self.bulk_inserted)?;
        writeln!(f, "first name:     {}", self.first_name.as_deref().unwrap_or("-"))?;
        writeln!(
            f,
            "found:          {} total, point query {}, {} in range",
            self.total_found,
            if self.point_query_hit { "hit" } else { "missed" },
            self.range_found
        )?;
        writeln!(
            f,
            "updated:        one {}/{}, many {}/{} (matched/modified)",
            self.updated_one.matched_count,
            self.updated_one.modified_count,
            self.updated_many.matched_count,
            self.updated_many.modified_count
        )?;
        writeln!(
            f,
            "deleted:        one {}, many {}",
            self.deleted_one.deleted_count, self.deleted_many.deleted_count
        )?;
        writeln!(f, "index:          {}", self.index_name)?;
        write!(f, "remaining:      {}", self.remaining)
    }
}

/// The sample document every run starts with.
pub fn sample_document() -> Document {
    DocumentBuilder::new()
        .append("name", "MongoDB")
        .append("type", "database")
        .append("count", 1)
        .append("versions", doc_array!["v3.2", "v3.0", "v2.6"])
        .append("info", doc! { x: 203, y: 102 })
        .finalize()
}

pub fn run(collection: &Collection) -> DocStoreResult<Summary> {
    section("Create a document");
    let document = sample_document();
    println!("{}", document.to_pretty_json()?);
    read_fields(&document)?;

    section("Insert one document");
    let inserted = collection.insert_one(&document)?;
    match &inserted {
        InsertOneResult::Acknowledged { inserted_id } => {
            println!("acknowledged, _id: {}", inserted_id.to_hex())
        }
        InsertOneResult::AcknowledgedWithoutObjectId { inserted_id } => {
            println!("acknowledged, _id is not an object id: {}", inserted_id)
        }
        InsertOneResult::Unacknowledged => println!("unacknowledged, no _id reported"),
    }

    section("Insert many documents");
    let documents: Vec<Document> = (0..BULK_SIZE).map(|n| doc! { i: n }).collect();
    let bulk = collection.insert_many(&documents)?;
    if bulk.acknowledged {
        println!("inserted {} documents", bulk.len());
    } else {
        println!("unacknowledged, no ids reported");
    }

    section("Find the first document");
    let first = collection.find_one(&doc! {})?;
    let first_name = match &first {
        Some(found) => {
            println!("{}", found.to_json()?);
            found.get_str("name").ok().map(str::to_string)
        }
        None => {
            println!("collection is empty");
            None
        }
    };

    section("Find all documents");
    let total_found = print_all(collection, &doc! {})?;
    println!("{} document(s)", total_found);

    section("Find a document with a filter");
    let hit = collection.find_one(&doc! { i: 71 })?;
    match &hit {
        Some(found) => println!("{}", found.to_json()?),
        None => println!("no document with i = 71"),
    }

    section("Find documents in a range");
    let range_found = print_all(collection, &doc! { i: { "$gt": 50, "$lte": 100 } })?;
    println!("{} document(s) with 50 < i <= 100", range_found);

    section("Update one document");
    let updated_one = collection.update_one(&doc! { i: 10 }, &doc! { "$set": { i: 110 } })?;
    println!("{}", updated_one);

    section("Update many documents");
    let updated_many = collection.update_many(&doc! { i: { "$lt": 100 } }, &doc! { "$inc": { i: 100 } })?;
    println!("{}", updated_many);

    section("Delete one document");
    let deleted_one = collection.delete_one(&doc! { i: 110 })?;
    println!("{}", deleted_one);

    section("Delete many documents");
    let deleted_many = collection.delete_many(&doc! { i: { "$gte": 100 } })?;
    println!("{}", deleted_many);

    section("Create an index");
    let index_name = collection.create_index(&IndexModel::from_keys(doc! { i: 1 }))?;
    println!("created index {}", index_name);

    let remaining = collection.count_documents(&doc! {})?;
    println!();
    println!("{} document(s) left in {}", remaining, collection.namespace());

    Ok(Summary {
        inserted,
        bulk_inserted: bulk.len(),
        first_name,
        total_found,
        point_query_hit: hit.is_some(),
        range_found,
        updated_one,
        updated_many,
        deleted_one,
        deleted_many,
        index_name,
        remaining,
    })
}

fn section(title: &str) {
    println!();
    println!("== {} ==", title);
}

fn read_fields(document: &Document) -> DocStoreResult<()> {
    println!("\"name\" : \"{}\"", document.get_str("name")?);

    // a typed read of the wrong type is reported, never coerced
    match document.get_str("count") {
        Ok(count) => println!("\"count\" : \"{}\"", count),
        Err(e) if e.kind() == &ErrorKind::TypeMismatch => {
            log::warn!("Reading count as a string: {}", e);
            println!("\"count\" is not a string, it holds {}", render(document.get("count")));
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

fn render(value: Option<&Value>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "nothing".to_string())
}

fn print_all(collection: &Collection, filter: &Document) -> DocStoreResult<usize> {
    let mut count = 0;
    for document in collection.find(filter)? {
        println!("{}", document?.to_json()?);
        count += 1;
    }
    Ok(count)
}
