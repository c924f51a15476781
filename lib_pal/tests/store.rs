mod common;

use common::{striped_grid, RGB_PALETTE};
use lib_pxsvg::compression::LzwCodec;
use lib_pxsvg::store::{MemoryBlobStore, StoreError};
use lib_pxsvg::{encode, render_full, ImageStore, Seed};

fn images(format: u8, count: u8) -> Vec<Vec<u8>> {
    (1..=count)
        .map(|color| vec![format, 0, 1, 1, 0, 1, color])
        .collect()
}

#[test]
fn test_fetch_resolves_second_page() {
    let mut store = ImageStore::new(MemoryBlobStore::new(), LzwCodec);
    store.add_images("heads", &images(0, 10)).unwrap();
    store.add_images("heads", &images(0, 5)).unwrap();

    let (page, local) = store.locate("heads", 12).unwrap();
    assert_eq!(local, 2);
    assert_eq!(*page, store.manifest().traits()["heads"].pages()[1]);
    assert_eq!(store.fetch_image("heads", 12).unwrap(), images(0, 5)[2]);

    assert!(matches!(
        store.fetch_image("heads", 15),
        Err(StoreError::ImageIndexNotFound { index: 15, total: 15 })
    ));
}

#[test]
fn test_traits_are_independent() {
    let mut store = ImageStore::new(MemoryBlobStore::new(), LzwCodec);
    store.add_images("heads", &images(0, 3)).unwrap();
    store.add_images("bodies", &images(0, 2)).unwrap();
    assert_eq!(store.image_count("heads"), 3);
    assert_eq!(store.image_count("bodies"), 2);
    assert!(store.fetch_image("bodies", 2).is_err());
}

#[test]
fn test_palette_length_rules() {
    let mut store = ImageStore::new(MemoryBlobStore::new(), LzwCodec);
    assert!(store.set_palette(0, &[0; 768]).is_ok());
    assert!(store.set_palette(1, &[0; 771]).is_err());
    assert!(store.set_palette(1, &[0; 5]).is_err());
    assert!(store.set_palette(1, &[]).is_err());
    assert_eq!(store.palette_count(), 1);
}

#[test]
fn test_stored_image_renders_like_direct() {
    let image = encode(2, &striped_grid()).unwrap();
    let mut store = ImageStore::new(MemoryBlobStore::new(), LzwCodec);
    store.set_palette(2, &RGB_PALETTE).unwrap();
    store.add_images("accessories", &[image.clone()]).unwrap();

    let seed = Seed {
        background: None,
        parts: vec![("accessories".to_string(), 0)],
    };
    let via_store = store.render_seed(&seed).unwrap();
    let part = store.part("accessories", 0).unwrap();
    assert_eq!(part.image, image);
    assert_eq!(via_store, render_full(&[part], None).unwrap());
}

#[test]
fn test_directory_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = ImageStore::open(dir.path()).unwrap();
        store.set_palette(0, &RGB_PALETTE).unwrap();
        store.add_images("glasses", &images(0, 3)).unwrap();
        store.add_background("d5d7e1").unwrap();
        store.save(dir.path()).unwrap();
    }

    let mut store = ImageStore::open(dir.path()).unwrap();
    store.add_images("glasses", &images(0, 2)).unwrap();
    assert_eq!(store.page_count("glasses"), 2);
    assert_eq!(store.fetch_image("glasses", 4).unwrap(), images(0, 2)[1]);
    assert_eq!(store.background(0).unwrap(), "d5d7e1");
    assert_eq!(store.fetch_palette(0).unwrap(), RGB_PALETTE.to_vec());
}
