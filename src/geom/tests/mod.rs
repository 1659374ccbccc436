mod test_extrusion_basic;
mod test_mesh_sanity;
