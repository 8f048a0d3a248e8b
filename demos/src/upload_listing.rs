//! Sign in as a seller and publish a listing with local images and a video.
//!
//! `upload_listing <email> <password> <video> <image>...`

use std::env;

use rentify::prelude::*;
use rentify::upload::{UPLOAD_SUCCESS, VIDEO_UPLOAD_SUCCESS};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 3 {
        println!("usage: upload_listing <email> <password> <video> <image>...");
        return Ok(());
    }

    let rentify = Rentify::from_env()?;
    let landing = rentify
        .accounts()
        .sign_in(&LoginForm {
            email: args[0].clone(),
            password: args[1].clone(),
        })
        .await?;
    if landing.role != Role::Seller {
        println!("{} is not a seller account", args[0]);
        return Ok(());
    }
    let session = rentify.session();

    let mut draft = UploadDraft::new(PropertyForm {
        title: "Sunny two bedroom near the park".into(),
        description: "Quiet street, five minutes from the metro.".into(),
        address: "12 MG Road".into(),
        city: "Pune".into(),
        property_type: "Apartment".into(),
        bedrooms: "2".into(),
        bathrooms: "1".into(),
        rent_price: "18500".into(),
        deposit_amount: "40000".into(),
        furnished: "Yes".into(),
        pet_friendly: "No".into(),
        lease_duration: "1 Year".into(),
        seller_name: landing.identity.display_name.clone().unwrap_or_default(),
        contact_email: args[0].clone(),
        ..Default::default()
    });

    let uploads = rentify.uploads();

    let mut images = Vec::new();
    for path in &args[3..] {
        images.push(LocalFile::open(path).await?);
    }
    let pending = uploads.add_images(&mut draft, images);
    println!("Uploading {} images in the background", pending.len());

    draft.set_video(LocalFile::open(&args[2]).await?);
    if let Some(mut task) = uploads.upload_video_resumable(&draft).await {
        while let Some(event) = task.next_event().await {
            match event {
                UploadEvent::Progress(progress) => {
                    println!("video {:>5.1}%", progress.fraction() * 100.0)
                }
                UploadEvent::Completed { url } => {
                    println!("{}", VIDEO_UPLOAD_SUCCESS);
                    draft.set_video_url(&url);
                }
                UploadEvent::Failed { message } => println!("video upload failed: {}", message),
            }
        }
    }

    for failed in draft.apply_resolved(pending.join().await) {
        println!("image {} failed to upload", failed.preview_id);
    }

    match uploads.submit(&session, &draft).await {
        Ok(record) => {
            println!("{}", Notice::success(UPLOAD_SUCCESS));
            println!("Listing saved as {}/{}", record.owner_id, record.property_id);
        }
        Err(err) => println!("{}", err.notice()),
    }
    Ok(())
}
