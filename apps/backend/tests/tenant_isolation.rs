//! Tenant-bound operations never see or touch another tenant's rows.

mod common;

use tillpoint_backend::services::{CreateSaleInput, SaleItemInput};
use tillpoint_backend::ErrorCode;
use tillpoint_core::{DiscountPercent, Money, NewProduct, ProductPatch, MAX_STOCK_ADJUSTMENT};

fn one_line_sale(product_id: &str, total: i64) -> CreateSaleInput {
    CreateSaleInput {
        items: vec![SaleItemInput {
            product_id: product_id.to_string(),
            quantity: 1,
        }],
        cashier: "Ayu".to_string(),
        payment_method: "cash".to_string(),
        discount: DiscountPercent::none(),
        claimed_total: Money::from_major(total),
        notes: None,
    }
}

#[tokio::test]
async fn test_products_are_invisible_across_tenants() {
    let app = common::app().await;
    let (a, _) = common::tenant(&app, "Warung A").await;
    let (b, _) = common::tenant(&app, "Warung B").await;
    let product = common::product(&app, &a, "NAS001", 12000, 10).await;

    let err = app.products().get(&b, &product.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(app.products().list(&b, 1, 10).await.unwrap().total, 0);
    assert_eq!(app.products().list(&a, 1, 10).await.unwrap().total, 1);

    let err = app
        .products()
        .update(
            &b,
            &product.id,
            ProductPatch {
                name: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let err = app.products().update_stock(&b, &product.id, 0).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let err = app.products().delete(&b, &product.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let untouched = app.products().get(&a, &product.id).await.unwrap();
    assert_eq!(untouched.name, "Product NAS001");
    assert_eq!(untouched.stock, 10);
}

#[tokio::test]
async fn test_sales_are_invisible_across_tenants() {
    let app = common::app().await;
    let (a, _) = common::tenant(&app, "Warung A").await;
    let (b, _) = common::tenant(&app, "Warung B").await;
    let product = common::product(&app, &a, "NAS001", 12000, 10).await;

    // B cannot sell A's product.
    let err = app
        .sales()
        .create_sale(&b, one_line_sale(&product.id, 12000))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(app.products().get(&a, &product.id).await.unwrap().stock, 10);

    let sale = app
        .sales()
        .create_sale(&a, one_line_sale(&product.id, 12000))
        .await
        .unwrap();

    let err = app.sales().get_sale(&b, &sale.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(app.sales().list_sales(&b, 1, 10).await.unwrap().total, 0);

    let report = app
        .reports()
        .sales_report(&b, "2000-01-01", "2999-12-31")
        .await
        .unwrap();
    assert_eq!(report.items_sold, 0);
}

#[tokio::test]
async fn test_sku_unique_per_tenant() {
    let app = common::app().await;
    let (a, _) = common::tenant(&app, "Warung A").await;
    let (b, _) = common::tenant(&app, "Warung B").await;

    common::product(&app, &a, "NAS001", 12000, 10).await;
    common::product(&app, &b, "NAS001", 11000, 10).await;

    let err = app
        .products()
        .create(
            &a,
            NewProduct {
                name: "Nasi Ayam Lagi".to_string(),
                sku: "NAS001".to_string(),
                cost_price: Money::zero(),
                sale_price: Money::from_major(1),
                stock: 0,
                image_ref: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DuplicateSku);

    let other = common::product(&app, &a, "TEH001", 3000, 1).await;
    let err = app
        .products()
        .update(
            &a,
            &other.id,
            ProductPatch {
                sku: Some("NAS001".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DuplicateSku);
}

#[tokio::test]
async fn test_delete_rules() {
    let app = common::app().await;
    let (a, _) = common::tenant(&app, "Warung A").await;
    let sold = common::product(&app, &a, "NAS001", 12000, 10).await;
    let unsold = common::product(&app, &a, "TEH001", 3000, 10).await;

    app.sales()
        .create_sale(&a, one_line_sale(&sold.id, 12000))
        .await
        .unwrap();

    let err = app.products().delete(&a, &sold.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Conflict);

    app.products().delete(&a, &unsold.id).await.unwrap();
    let err = app.products().get(&a, &unsold.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_product_updates() {
    let app = common::app().await;
    let (a, _) = common::tenant(&app, "Warung A").await;
    let product = common::product(&app, &a, "NAS001", 12000, 10).await;

    let updated = app.products().update_stock(&a, &product.id, 3).await.unwrap();
    assert_eq!(updated.stock, 3);

    let err = app.products().update_stock(&a, &product.id, -1).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let err = app
        .products()
        .update(&a, &product.id, ProductPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let err = app.products().get(&a, "zzzz").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTokenFormat);
}

#[tokio::test]
async fn test_adjust_stock() {
    let app = common::app().await;
    let (a, _) = common::tenant(&app, "Warung A").await;
    let (b, _) = common::tenant(&app, "Warung B").await;
    let product = common::product(&app, &a, "NAS001", 12000, 10).await;

    let restocked = app.products().adjust_stock(&a, &product.id, 5).await.unwrap();
    assert_eq!(restocked.stock, 15);

    let err = app
        .products()
        .adjust_stock(&a, &product.id, -16)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientStock);
    assert_eq!(app.products().get(&a, &product.id).await.unwrap().stock, 15);

    let err = app
        .products()
        .adjust_stock(&b, &product.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    for delta in [0, i64::MIN, i64::MAX, MAX_STOCK_ADJUSTMENT + 1] {
        let err = app
            .products()
            .adjust_stock(&a, &product.id, delta)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError, "delta {delta}");
    }
    assert_eq!(app.products().get(&a, &product.id).await.unwrap().stock, 15);
}
