//! Shared metamodel for unit tests.

use index_tracking_shared::{InMemoryMetamodel, MetamodelBuilder, PropertyPath};

/// A small order-management model:
///
/// `Order.customer -> Customer`, `Order.lines -> OrderLine (many)`,
/// `OrderLine.product -> Product`, `Order.shipping` and `Customer.address`
/// embed `Address`. Customers are named by first and last name, products by
/// title. `Audit` is referenced by nothing.
pub(crate) fn shop() -> InMemoryMetamodel {
    let mut builder = MetamodelBuilder::new();
    builder
        .class("Order")
        .datatype("number", "string")
        .enumeration("status", "OrderStatus")
        .reference("customer", "Customer")
        .embedded("shipping", "Address")
        .collection("lines", "OrderLine");
    builder
        .class("Customer")
        .datatype("firstName", "string")
        .datatype("lastName", "string")
        .embedded("address", "Address")
        .reference("account", "Account")
        .instance_name(&["firstName", "lastName"]);
    builder
        .class("Address")
        .datatype("zip", "string")
        .datatype("city", "string");
    builder
        .class("OrderLine")
        .datatype("quantity", "int")
        .reference("product", "Product");
    builder
        .class("Product")
        .datatype("sku", "string")
        .datatype("title", "string")
        .instance_name(&["title"]);
    builder.class("Account").datatype("login", "string");
    builder.class("Audit").datatype("message", "string");
    builder.build().expect("fixture metamodel is valid")
}

/// Resolve `dotted` against the class named `root`.
pub(crate) fn path(metamodel: &InMemoryMetamodel, root: &str, dotted: &str) -> PropertyPath {
    let root = metamodel.class_id(root).expect("fixture class exists");
    PropertyPath::parse(metamodel, root, dotted).expect("fixture path resolves")
}
