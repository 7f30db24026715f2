//! Product images in tenant-namespaced object storage.

mod common;

use tillpoint_backend::ErrorCode;
use tillpoint_core::ProductPatch;

#[tokio::test]
async fn test_upload_url_reserves_namespaced_key() {
    let app = common::app().await;
    let (scope, tenant_token) = common::tenant(&app, "Warung A").await;
    let product = common::product(&app, &scope, "NAS001", 12000, 1).await;

    let presigned = app
        .products()
        .image_upload_url(&scope, &product.id, ".PNG")
        .await
        .unwrap();

    let prefix = format!("tenants/{}/products/{}_", tenant_token, product.id);
    assert!(presigned.key.starts_with(&prefix), "{}", presigned.key);
    assert!(presigned.key.ends_with(".png"));
    assert!(presigned.url.contains("method=PUT"));
    assert_eq!(presigned.expires_in_secs, 900);

    let stored = app.products().get(&scope, &product.id).await.unwrap();
    assert_eq!(stored.image_ref.as_deref(), Some(presigned.key.as_str()));

    let download = app
        .products()
        .image_download_url(&scope, &product.id)
        .await
        .unwrap();
    assert_eq!(download.key, presigned.key);
    assert!(download.url.contains("method=GET"));
    assert_eq!(download.expires_in_secs, 3600);
}

#[tokio::test]
async fn test_upload_and_download_bytes() {
    let app = common::app().await;
    let (scope, _) = common::tenant(&app, "Warung A").await;
    let product = common::product(&app, &scope, "NAS001", 12000, 1).await;

    let err = app
        .products()
        .download_image(&scope, &product.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let updated = app
        .products()
        .upload_image(&scope, &product.id, vec![0x89, b'P', b'N', b'G'], "image/png")
        .await
        .unwrap();
    assert!(updated.image_ref.unwrap().ends_with(".png"));

    let bytes = app.products().download_image(&scope, &product.id).await.unwrap();
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);

    let err = app
        .products()
        .upload_image(&scope, &product.id, Vec::new(), "image/png")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let err = app
        .products()
        .upload_image(&scope, &product.id, vec![1], "application/pdf")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_foreign_image_ref_is_not_served() {
    let app = common::app().await;
    let (a, _) = common::tenant(&app, "Warung A").await;
    let (b, b_token) = common::tenant(&app, "Warung B").await;
    let product_a = common::product(&app, &a, "NAS001", 12000, 1).await;
    let product_b = common::product(&app, &b, "NAS001", 12000, 1).await;

    let b_image = app
        .products()
        .upload_image(&b, &product_b.id, vec![7, 7, 7], "image/jpeg")
        .await
        .unwrap();
    let b_key = b_image.image_ref.unwrap();
    assert!(b_key.starts_with(&format!("tenants/{b_token}/")));

    // A product of tenant A pointing into tenant B's namespace.
    app.products()
        .update(
            &a,
            &product_a.id,
            ProductPatch {
                image_ref: Some(b_key),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = app.products().download_image(&a, &product_a.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    let err = app
        .products()
        .image_download_url(&a, &product_a.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let err = app.products().download_image(&a, &product_b.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}
