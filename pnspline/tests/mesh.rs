//! Tests for control mesh construction, access and file loading.
mod test_utils;

use pnspline::{mesh::MeshFormat, ControlMesh, Error, Index};
use std::fs;

#[test]
fn test_empty_mesh() {
    let mesh = ControlMesh::new();
    assert_eq!(mesh.vertex_count(), 0);
    assert_eq!(mesh.face_count(), 0);
    assert!(mesh.vertices().is_empty());
    assert!(mesh.faces().is_empty());
}

#[test]
fn test_from_data_keeps_face_arity() {
    let mesh = test_utils::mixed();
    assert_eq!(mesh.vertex_count(), 8);
    let arities = mesh.faces().iter().map(Vec::len).collect::<Vec<_>>();
    assert_eq!(arities, vec![5, 3, 4]);
    assert_eq!(
        mesh.face(1).unwrap(),
        &[Index(1), Index(0), Index(5)][..]
    );
    assert!(mesh.face(3).is_none());
}

#[test]
fn test_from_data_rejects_out_of_range_index() {
    let result = ControlMesh::from_data(&test_utils::unit_quad_vertices(), &[[0u32, 1, 2, 4]]);
    assert!(matches!(result, Err(Error::MalformedMesh(_))));
}

#[test]
fn test_from_data_rejects_degenerate_face() {
    let result = ControlMesh::from_data(&test_utils::unit_quad_vertices(), &[[0u32, 1]]);
    assert!(matches!(result, Err(Error::MalformedMesh(_))));
}

#[test]
fn test_from_flat() -> anyhow::Result<()> {
    let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 2.0, 0.5, 0.0];
    let mesh = ControlMesh::from_flat(&positions, &[4, 3], &[0, 1, 2, 3, 1, 4, 2])?;

    assert_eq!(mesh.vertex_count(), 5);
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(mesh.flat_vertices(), &positions[..]);

    assert!(ControlMesh::from_flat(&positions[..4], &[3], &[0, 1, 2]).is_err());
    assert!(ControlMesh::from_flat(&positions, &[4, 3], &[0, 1, 2, 3]).is_err());
    Ok(())
}

#[test]
fn test_vertex_access() -> anyhow::Result<()> {
    let mut mesh = test_utils::unit_quad();
    assert_eq!(mesh.vertex(2)?, [1.0, 1.0, 0.0]);

    mesh.set_vertex(2, [1.0, 1.0, 3.0])?;
    assert_eq!(mesh.vertex(2)?, [1.0, 1.0, 3.0]);
    // Only the targeted vertex moves.
    assert_eq!(&mesh.vertices()[..2], &test_utils::unit_quad_vertices()[..2]);
    assert_eq!(mesh.vertices()[3], test_utils::unit_quad_vertices()[3]);

    assert!(matches!(
        mesh.vertex(4),
        Err(Error::IndexOutOfRange { index: 4, len: 4 })
    ));
    assert!(matches!(
        mesh.set_vertex(9, [0.0; 3]),
        Err(Error::IndexOutOfRange { index: 9, len: 4 })
    ));
    Ok(())
}

#[test]
fn test_clone_is_independent() -> anyhow::Result<()> {
    let mesh = test_utils::unit_quad();
    let mut copy = mesh.clone();
    assert_eq!(copy, mesh);

    copy.set_vertex(0, [-1.0, -1.0, 0.0])?;
    assert_ne!(copy, mesh);
    assert_eq!(mesh.vertex(0)?, [0.0, 0.0, 0.0]);
    Ok(())
}

#[test]
fn test_load_obj() -> anyhow::Result<()> {
    let path = test_utils::test_output_path("mesh_cube.obj");
    fs::write(&path, test_utils::CUBE_OBJ)?;

    let mesh = ControlMesh::from_file(&path)?;
    assert_eq!(mesh, test_utils::cube());
    Ok(())
}

#[test]
fn test_load_off() -> anyhow::Result<()> {
    let path = test_utils::test_output_path("mesh_mixed.off");
    let text = "OFF\n# square and triangle\n5 2 0\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n2 0.5 0\n4 0 1 2 3\n3 1 4 2\n";
    fs::write(&path, text)?;

    let mesh = ControlMesh::from_file(&path)?;
    assert_eq!(mesh.vertex_count(), 5);
    assert_eq!(mesh.face(1).unwrap(), &[Index(1), Index(4), Index(2)][..]);
    Ok(())
}

#[test]
fn test_write_obj_reads_back() -> anyhow::Result<()> {
    let mesh = test_utils::mixed();
    let mut text = Vec::new();
    mesh.write_obj(&mut text)?;

    let read = ControlMesh::read(text.as_slice(), MeshFormat::Obj)?;
    assert_eq!(read, mesh);
    Ok(())
}

#[test]
fn test_load_failures() {
    let missing = test_utils::test_output_path("does_not_exist.obj");
    let _ = fs::remove_file(&missing);
    assert!(matches!(
        ControlMesh::from_file(&missing),
        Err(Error::MeshLoad { .. })
    ));

    let unsupported = test_utils::test_output_path("mesh.xyz");
    fs::write(&unsupported, "1 2 3\n").unwrap();
    assert!(matches!(
        ControlMesh::from_file(&unsupported),
        Err(Error::MeshLoad { .. })
    ));

    let empty = test_utils::test_output_path("mesh_empty.obj");
    fs::write(&empty, "# nothing\n").unwrap();
    assert!(matches!(
        ControlMesh::from_file(&empty),
        Err(Error::MeshLoad { .. })
    ));

    assert!(matches!(
        ControlMesh::read("v 0 0 0\nv 1 0 0\nf 1 2 x\n".as_bytes(), MeshFormat::Obj),
        Err(Error::MeshLoad { .. })
    ));
}

#[test]
fn test_format_names() {
    assert_eq!("off".parse::<MeshFormat>(), Ok(MeshFormat::Off));
    assert!("ply".parse::<MeshFormat>().is_err());
}

#[test]
fn test_off_with_huge_counts() {
    for header in ["18446744073709551615 1 0", "4000000000 4000000000 0"] {
        let text = format!("OFF\n{header}\n0 0 0\n");
        assert!(matches!(
            ControlMesh::read(text.as_bytes(), MeshFormat::Off),
            Err(Error::MeshLoad { .. })
        ));
    }
}
