//! Tests for incremental patch updates.
mod test_utils;

use pnspline::{patch::build_all_patches, process, Error, Index, Surface};

#[test]
fn test_new_builds_every_patch() -> anyhow::Result<()> {
    let mesh = test_utils::mixed();
    let surface = Surface::new(mesh.clone())?;

    let builders = process::get_patch_builders(&mesh)?;
    assert_eq!(surface.builders().len(), builders.len());
    assert_eq!(surface.patch_count(), 9);
    assert_eq!(surface.patches(), &build_all_patches(&builders, &mesh)?[..]);
    assert!(surface.patch(9).is_none());
    Ok(())
}

#[test]
fn test_update_rebuilds_referencing_patches() -> anyhow::Result<()> {
    let mut surface = Surface::new(test_utils::mixed())?;
    let before = surface.patches().to_vec();

    // The triangle apex only belongs to the second face.
    let changed = surface.update_control_mesh(&[(Index(5), [1.2, 1.0, 1.0])])?;
    assert_eq!(changed, vec![5, 6, 7]);

    for (index, (old, new)) in before.iter().zip(surface.patches()).enumerate() {
        if changed.contains(&index) {
            assert_ne!(old, new);
        } else {
            assert_eq!(old, new);
        }
    }
    assert_eq!(surface.mesh().vertex(5)?, [1.2, 1.0, 1.0]);

    // Shared vertex of the pentagon and the triangle.
    let changed = surface.update_control_mesh(&[(Index(0), [1.0, 0.0, 0.5])])?;
    assert_eq!(changed, (0..8).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_update_matches_full_rebuild() -> anyhow::Result<()> {
    let mut surface = Surface::new(test_utils::lattice(6))?;
    let changed = surface.update_control_mesh(&[
        (Index(8), [1.0, 1.0, 1.0]),
        (Index(40), [5.0, 5.0, -1.0]),
    ])?;
    assert!(changed.windows(2).all(|pair| pair[0] < pair[1]));

    let mesh = surface.mesh().clone();
    let builders = process::get_patch_builders(&mesh)?;
    assert_eq!(surface.patches(), &build_all_patches(&builders, &mesh)?[..]);
    Ok(())
}

#[test]
fn test_empty_update() -> anyhow::Result<()> {
    let mut surface = Surface::new(test_utils::cube())?;
    let before = surface.patches().to_vec();
    assert!(surface.update_control_mesh(&[])?.is_empty());
    assert_eq!(surface.patches(), &before[..]);
    Ok(())
}

#[test]
fn test_out_of_range_update_moves_nothing() -> anyhow::Result<()> {
    let mut surface = Surface::new(test_utils::cube())?;
    let before = surface.clone();

    let result = surface.update_control_mesh(&[
        (Index(0), [-1.0, -1.0, -1.0]),
        (Index(8), [0.0, 0.0, 0.0]),
    ]);
    assert!(matches!(
        result,
        Err(Error::IndexOutOfRange { index: 8, len: 8 })
    ));
    assert_eq!(surface.mesh(), before.mesh());
    assert_eq!(surface.patches(), before.patches());
    Ok(())
}

#[test]
fn test_degree_raise() -> anyhow::Result<()> {
    let mut surface = Surface::new(test_utils::cube())?;
    let corners = surface
        .patches()
        .iter()
        .map(|patch| patch.corners())
        .collect::<Result<Vec<_>, _>>()?;

    surface.degree_raise()?;
    assert!(surface.patches().iter().all(|patch| patch.degree() == (2, 2)));
    for (patch, corners) in surface.patches().iter().zip(&corners) {
        assert_eq!(&patch.corners()?, corners);
    }

    // Updates keep the raised degree.
    surface.update_control_mesh(&[(Index(7), [1.0, 1.0, 1.5])])?;
    assert!(surface.patches().iter().all(|patch| patch.degree() == (2, 2)));

    surface.degree_raise()?;
    surface.degree_raise()?;
    let mesh = surface.into_mesh();
    assert_eq!(mesh.vertex(7)?, [1.0, 1.0, 1.5]);
    Ok(())
}
